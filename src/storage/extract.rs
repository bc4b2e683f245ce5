//! Extract record upsert and read-only schedule queries.
//!
//! The upsert is check-then-act: look the row up by its exact composite key
//! (a NULL region matches only other NULL-region rows), update if found,
//! insert otherwise. Two concurrent submissions for the same new key can
//! both observe "not found"; the loser's insert hits the unique index and is
//! transparently retried as an update. That recovery is a required
//! correctness property, never surfaced to the caller.

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use tracing::warn;

use crate::resolver::{ResolvedIdentity, ScheduleEntry, ScheduleLookup};

/// Passes through the check/insert/recover loop before giving up. More than
/// one retry only happens if rows are being deleted underneath us.
const UPSERT_ATTEMPTS: usize = 3;

/// Result-numbers payload stored alongside the resolved identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractPayload {
    /// Drawn numbers, space-joined in draw order
    pub numbers: String,
    pub letters: Option<String>,
    pub source: String,
}

/// Row id plus whether the operation created or updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub id: i64,
    pub created: bool,
}

/// Idempotent insert-or-update keyed by (game, draw number, date, region).
///
/// A second submission with the same key updates numbers/letters/source and
/// never creates a duplicate row. The `validated` flag defaults false on
/// insert and is left untouched by updates.
pub fn upsert_extract(
    conn: &Connection,
    identity: &ResolvedIdentity,
    payload: &ExtractPayload,
) -> rusqlite::Result<UpsertOutcome> {
    let mut last_conflict: Option<rusqlite::Error> = None;

    for _ in 0..UPSERT_ATTEMPTS {
        if let Some(id) = find_extract(conn, identity)? {
            update_extract(conn, id, payload)?;
            return Ok(UpsertOutcome { id, created: false });
        }
        match insert_extract(conn, identity, payload) {
            Ok(id) => return Ok(UpsertOutcome { id, created: true }),
            Err(e) if is_unique_violation(&e) => {
                // Lost the check-then-act race to a concurrent submission for
                // the same key; the row exists now, so the next pass updates it.
                warn!(
                    "[EXTRACT] Insert conflict for game {} draw {} on {} - retrying as update",
                    identity.game_id, identity.draw_number, identity.draw_date
                );
                last_conflict = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_conflict.unwrap_or(rusqlite::Error::QueryReturnedNoRows))
}

/// Exact-key lookup. NULL region is its own slot, not a wildcard.
fn find_extract(conn: &Connection, identity: &ResolvedIdentity) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        "SELECT id FROM extracts
         WHERE game_id = ?1 AND draw_number = ?2 AND draw_date = ?3
           AND ((region_id IS NULL AND ?4 IS NULL) OR region_id = ?4)",
        params![
            identity.game_id,
            identity.draw_number,
            identity.draw_date.to_string(),
            identity.region_id,
        ],
        |row| row.get(0),
    )
    .optional()
}

fn insert_extract(
    conn: &Connection,
    identity: &ResolvedIdentity,
    payload: &ExtractPayload,
) -> rusqlite::Result<i64> {
    let now = chrono::Utc::now().timestamp();
    conn.execute(
        "INSERT INTO extracts (game_id, draw_number, draw_date, region_id,
             numbers, letters, source, validated, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?8)",
        params![
            identity.game_id,
            identity.draw_number,
            identity.draw_date.to_string(),
            identity.region_id,
            payload.numbers,
            payload.letters,
            payload.source,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn update_extract(conn: &Connection, id: i64, payload: &ExtractPayload) -> rusqlite::Result<()> {
    let now = chrono::Utc::now().timestamp();
    conn.execute(
        "UPDATE extracts
         SET numbers = ?1, letters = ?2, source = ?3, updated_at = ?4
         WHERE id = ?5",
        params![payload.numbers, payload.letters, payload.source, now, id],
    )?;
    Ok(())
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

/// Read-only schedule queries backed by the store connection.
pub struct SqliteSchedule<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteSchedule<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl ScheduleLookup for SqliteSchedule<'_> {
    fn entry_for_draw(&self, game_id: i64, draw_number: u32) -> Result<Option<ScheduleEntry>> {
        let entry = self
            .conn
            .query_row(
                "SELECT game_id, draw_number, draw_date, modality
                 FROM schedule WHERE game_id = ?1 AND draw_number = ?2",
                params![game_id, draw_number],
                row_to_entry,
            )
            .optional()?;
        Ok(entry)
    }

    fn latest_for_date(
        &self,
        game_id: i64,
        date: NaiveDate,
        modality: &str,
    ) -> Result<Option<ScheduleEntry>> {
        let entry = self
            .conn
            .query_row(
                "SELECT game_id, draw_number, draw_date, modality
                 FROM schedule
                 WHERE game_id = ?1 AND draw_date = ?2 AND modality = ?3
                 ORDER BY id DESC LIMIT 1",
                params![game_id, date.to_string(), modality],
                row_to_entry,
            )
            .optional()?;
        Ok(entry)
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScheduleEntry> {
    let date_text: String = row.get(2)?;
    let draw_date = date_text.parse::<NaiveDate>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(ScheduleEntry {
        game_id: row.get(0)?,
        draw_number: row.get(1)?,
        draw_date,
        modality: row.get(3)?,
    })
}
