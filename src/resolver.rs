//! Draw identity resolution for extract submissions.
//!
//! Turns a free-form submission (game name variant, region code or name,
//! optional explicit draw number, date, modality) into a canonical
//! (game id, draw number, date, region id) tuple, consulting the read-only
//! reference schedule through the [`ScheduleLookup`] seam. Shape validation
//! runs before any resolution, so the priority chain only ever sees
//! type-checked values.

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::Catalog;

/// Draw number recorded when no resolution path produced a real one.
/// A sentinel resolution is a degraded success for operators to reconcile,
/// not a failure.
pub const UNRESOLVED_DRAW_NUMBER: u32 = 0;

/// One extract submission as received from OCR, XML import, or manual entry.
///
/// `game` and `numbers` are required; everything else is optional and
/// resolved or defaulted downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractSubmission {
    /// Free-text game name, matched against the catalog alias table
    pub game: String,
    /// Region as numeric code, legacy alternate code, or name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Modality code (time-of-day slot) for schedule lookups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Explicit draw number; trusted outright when it parses as a positive integer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draw_number: Option<String>,
    /// Drawn numbers, in draw order
    pub numbers: Vec<String>,
    /// Drawn letters, for games that publish them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letters: Option<String>,
    /// Origin tag; defaults to the generic manual/OCR tag when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// One row of the authoritative draw schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub game_id: i64,
    pub draw_number: u32,
    pub draw_date: NaiveDate,
    pub modality: String,
}

/// Read-only view of the reference schedule. The schedule's lifecycle is
/// owned elsewhere; this crate only queries it.
pub trait ScheduleLookup {
    /// Entry for an exact (game, draw number), if scheduled.
    fn entry_for_draw(&self, game_id: i64, draw_number: u32) -> Result<Option<ScheduleEntry>>;

    /// Most recent entry for (game, date, modality), by internal recency.
    fn latest_for_date(
        &self,
        game_id: i64,
        date: NaiveDate,
        modality: &str,
    ) -> Result<Option<ScheduleEntry>>;
}

/// Canonical identity a submission resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub game_id: i64,
    /// [`UNRESOLVED_DRAW_NUMBER`] when resolution was degraded
    pub draw_number: u32,
    pub draw_date: NaiveDate,
    pub region_id: Option<i64>,
    /// True when the draw number fell back to the sentinel
    pub degraded: bool,
}

/// User-correctable rejection reasons. Every variant carries enough context
/// for a human-readable message; none of them leave a partial write behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    UnknownGame { input: String },
    EmptyNumbers,
    MalformedNumbers { value: String },
    MissingDate,
    MissingRegion { game: String },
    Store(String),
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitError::UnknownGame { input } => {
                write!(f, "Unrecognized game name: '{}'", input)
            }
            SubmitError::EmptyNumbers => {
                write!(f, "Numbers sequence is required and must not be empty")
            }
            SubmitError::MalformedNumbers { value } => {
                write!(f, "Malformed numbers entry: '{}'", value)
            }
            SubmitError::MissingDate => {
                write!(f, "Draw date could not be resolved and none was supplied")
            }
            SubmitError::MissingRegion { game } => {
                write!(f, "Game '{}' requires a region and none resolved", game)
            }
            SubmitError::Store(reason) => {
                write!(f, "Storage failure: {}", reason)
            }
        }
    }
}

impl std::error::Error for SubmitError {}

/// Shape validation, run before any resolution or store access.
pub fn validate_shape(submission: &ExtractSubmission) -> Result<(), SubmitError> {
    if submission.numbers.is_empty() {
        return Err(SubmitError::EmptyNumbers);
    }
    for entry in &submission.numbers {
        if entry.is_empty() || !entry.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SubmitError::MalformedNumbers {
                value: entry.clone(),
            });
        }
    }
    Ok(())
}

/// Resolve a submission to its canonical identity.
///
/// Resolution order (first success wins):
/// 1. an explicit positive draw number is trusted outright — the schedule is
///    consulted only when a date was also supplied, to swap in the
///    authoritative date (caller date if the schedule has no such entry);
/// 2. a date + modality pair resolves through the most recent matching
///    schedule entry;
/// 3. otherwise the draw number degrades to the sentinel and the caller's
///    date is used as-is — logged for later reconciliation.
///
/// Hard validation after the chain: a resolved date is mandatory, and
/// region-mandatory games must have resolved a region id.
pub fn resolve_identity(
    catalog: &Catalog,
    schedule: &dyn ScheduleLookup,
    submission: &ExtractSubmission,
) -> Result<ResolvedIdentity, SubmitError> {
    validate_shape(submission)?;

    let game = catalog
        .resolve_game(&submission.game)
        .ok_or_else(|| SubmitError::UnknownGame {
            input: submission.game.clone(),
        })?;

    let region = submission
        .region
        .as_deref()
        .and_then(|input| catalog.resolve_region(input));

    let explicit_number = submission
        .draw_number
        .as_deref()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|n| *n > 0);

    let (draw_number, resolved_date, degraded) = if let Some(number) = explicit_number {
        let date = match submission.date {
            Some(caller_date) => {
                match schedule
                    .entry_for_draw(game.id, number)
                    .map_err(store_error)?
                {
                    Some(entry) => Some(entry.draw_date),
                    None => Some(caller_date),
                }
            }
            None => None,
        };
        (number, date, false)
    } else if let (Some(date), Some(modality)) = (submission.date, submission.modality.as_deref()) {
        match schedule
            .latest_for_date(game.id, date, modality)
            .map_err(store_error)?
        {
            Some(entry) => (entry.draw_number, Some(entry.draw_date), false),
            None => {
                warn!(
                    "[RESOLVER] No schedule entry for game '{}' on {} modality '{}' - recording sentinel draw number",
                    game.name, date, modality
                );
                (UNRESOLVED_DRAW_NUMBER, Some(date), true)
            }
        }
    } else {
        warn!(
            "[RESOLVER] Draw number unresolved for game '{}' - recording sentinel for operator reconciliation",
            game.name
        );
        (UNRESOLVED_DRAW_NUMBER, submission.date, true)
    };

    let draw_date = resolved_date.ok_or(SubmitError::MissingDate)?;

    // Sentinel draw numbers are tolerable; a missing mandatory region is not.
    if game.requires_region && region.is_none() {
        return Err(SubmitError::MissingRegion {
            game: game.name.clone(),
        });
    }

    Ok(ResolvedIdentity {
        game_id: game.id,
        draw_number,
        draw_date,
        region_id: region.map(|r| r.id),
        degraded,
    })
}

fn store_error(err: anyhow::Error) -> SubmitError {
    SubmitError::Store(err.to_string())
}
