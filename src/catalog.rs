//! Immutable reference tables for venue, game, and region resolution.
//!
//! All lookup data is constructed once at startup and passed explicitly into
//! the decoder and resolver. The game alias list is an ordered,
//! most-specific-first sequence, so matching priority is a stated property
//! of the table rather than an accident of map iteration order.

use rustc_hash::FxHashMap;

/// A wagering venue appearing in the leading field of ledger lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Venue {
    /// Fixed 4-character code used by the ledger producer
    pub code: String,
    /// Short abbreviation, concatenated with the meeting number to form a draw key
    pub abbr: String,
    /// Human-readable venue name
    pub name: String,
}

/// A lottery game known to the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub id: i64,
    pub name: String,
    /// Whether business rules demand a resolved region for this game's extracts
    pub requires_region: bool,
}

/// One entry of the ordered game alias list.
///
/// Patterns are lowercase and matched as substrings of the submitted game
/// text. Sub-variant names must be listed before their generic parent so the
/// parent substring cannot steal the match.
#[derive(Debug, Clone)]
struct GameAlias {
    pattern: String,
    game_id: i64,
}

/// An administrative region used to scope outlets and some games' draws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub id: i64,
    /// Numeric code (the primary identifier in submissions)
    pub code: u32,
    /// Single-letter legacy code still emitted by older producers
    pub alt_code: String,
    pub name: String,
}

/// Immutable reference tables, built once and shared by reference.
#[derive(Debug, Clone)]
pub struct Catalog {
    venues: FxHashMap<String, Venue>,
    games: Vec<Game>,
    aliases: Vec<GameAlias>,
    regions: Vec<Region>,
}

impl Catalog {
    /// Build a catalog from explicit tables.
    ///
    /// `aliases` is (lowercase pattern, game id) in priority order.
    pub fn new(
        venues: Vec<Venue>,
        games: Vec<Game>,
        aliases: Vec<(&str, i64)>,
        regions: Vec<Region>,
    ) -> Self {
        let venues = venues
            .into_iter()
            .map(|v| (v.code.clone(), v))
            .collect();
        let aliases = aliases
            .into_iter()
            .map(|(pattern, game_id)| GameAlias {
                pattern: pattern.to_lowercase(),
                game_id,
            })
            .collect();
        Self {
            venues,
            games,
            aliases,
            regions,
        }
    }

    /// The built-in production tables.
    pub fn with_defaults() -> Self {
        let venues = vec![
            venue("0101", "CPK", "Central Park Raceway"),
            venue("0102", "RVD", "Riverside Downs"),
            venue("0205", "HBR", "Harbor City Track"),
            venue("0301", "GVL", "Greenvale Park"),
        ];

        let games = vec![
            game(1, "Pick Three", true),
            game(2, "Pick Three Express", true),
            game(3, "Grand Lotto", false),
            game(4, "Lucky Letters", false),
        ];

        // Priority order matters: "pick three express" before "pick three",
        // otherwise the parent name swallows every Express submission.
        let aliases = vec![
            ("pick three express", 2),
            ("pick 3 express", 2),
            ("pick three", 1),
            ("pick 3", 1),
            ("grand lotto", 3),
            ("grand", 3),
            ("lucky letters", 4),
            ("lucky", 4),
        ];

        let regions = vec![
            region(1, 1, "C", "Capital"),
            region(2, 2, "N", "Northgate"),
            region(3, 3, "S", "Southbay"),
            region(4, 7, "H", "Highland"),
        ];

        Self::new(venues, games, aliases, regions)
    }

    /// Look up a venue by its 4-character ledger code.
    pub fn venue(&self, code: &str) -> Option<&Venue> {
        self.venues.get(code)
    }

    pub fn game_by_id(&self, id: i64) -> Option<&Game> {
        self.games.iter().find(|g| g.id == id)
    }

    /// Resolve free-form game text against the ordered alias list.
    ///
    /// Matching is case-insensitive and substring-based: the first alias whose
    /// pattern occurs anywhere in the input wins.
    pub fn resolve_game(&self, text: &str) -> Option<&Game> {
        let normalized = text.to_lowercase();
        self.aliases
            .iter()
            .find(|alias| normalized.contains(&alias.pattern))
            .and_then(|alias| self.game_by_id(alias.game_id))
    }

    /// Resolve region input: numeric code first, then legacy alternate code,
    /// then case-insensitive exact name. `None` means unresolved, which is
    /// not an error by itself.
    pub fn resolve_region(&self, input: &str) -> Option<&Region> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(code) = trimmed.parse::<u32>() {
            if let Some(r) = self.regions.iter().find(|r| r.code == code) {
                return Some(r);
            }
        }
        if let Some(r) = self
            .regions
            .iter()
            .find(|r| r.alt_code.eq_ignore_ascii_case(trimmed))
        {
            return Some(r);
        }
        self.regions
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(trimmed))
    }
}

fn venue(code: &str, abbr: &str, name: &str) -> Venue {
    Venue {
        code: code.to_string(),
        abbr: abbr.to_string(),
        name: name.to_string(),
    }
}

fn game(id: i64, name: &str, requires_region: bool) -> Game {
    Game {
        id,
        name: name.to_string(),
        requires_region,
    }
}

fn region(id: i64, code: u32, alt_code: &str, name: &str) -> Region {
    Region {
        id,
        code,
        alt_code: alt_code.to_string(),
        name: name.to_string(),
    }
}
