//! Idempotent persistence of aggregated per-outlet ledger totals.
//!
//! Each record is written with replace-on-conflict semantics keyed by
//! (draw key, outlet code): re-running the writer with the same aggregates
//! converges to those values instead of summing with a prior run. Records
//! autocommit independently so one failure never aborts its siblings.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;

use crate::aggregate::OutletTotals;

/// How a single record landed in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Inserted,
    Updated,
}

/// One record that failed to persist, with a human-readable reason.
#[derive(Debug, Clone)]
pub struct LedgerWriteFailure {
    pub draw_key: String,
    pub outlet_code: String,
    pub reason: String,
}

/// Per-record outcomes of one ledger write pass.
#[derive(Debug, Default)]
pub struct LedgerWriteReport {
    pub inserted: usize,
    pub updated: usize,
    pub failures: Vec<LedgerWriteFailure>,
}

impl LedgerWriteReport {
    pub fn written(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Persist a finalized aggregate set, one row per (draw key, outlet).
///
/// A failure on one record is recorded and the remaining records still
/// execute; the caller decides whether to report or retry the failures.
pub fn write_outlet_totals(conn: &Connection, records: &[OutletTotals]) -> LedgerWriteReport {
    let mut report = LedgerWriteReport::default();
    for record in records {
        match write_one(conn, record) {
            Ok(WriteOutcome::Inserted) => report.inserted += 1,
            Ok(WriteOutcome::Updated) => report.updated += 1,
            Err(e) => {
                warn!(
                    "[LEDGER] Failed to store totals for {} outlet {}: {}",
                    record.draw_key, record.outlet_code, e
                );
                report.failures.push(LedgerWriteFailure {
                    draw_key: record.draw_key.clone(),
                    outlet_code: record.outlet_code.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    report
}

fn write_one(conn: &Connection, record: &OutletTotals) -> rusqlite::Result<WriteOutcome> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM outlet_totals WHERE draw_key = ?1 AND outlet_code = ?2",
            params![record.draw_key, record.outlet_code],
            |row| row.get(0),
        )
        .optional()?;

    let now = chrono::Utc::now().timestamp();

    // Replace, never increment: the aggregate already holds the batch total.
    conn.execute(
        "INSERT INTO outlet_totals (draw_key, outlet_code, region_code, draw_date,
             wagered_cents, cancelled_cents, refunded_cents, paid_cents, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(draw_key, outlet_code) DO UPDATE SET
             region_code = excluded.region_code,
             draw_date = excluded.draw_date,
             wagered_cents = excluded.wagered_cents,
             cancelled_cents = excluded.cancelled_cents,
             refunded_cents = excluded.refunded_cents,
             paid_cents = excluded.paid_cents,
             updated_at = excluded.updated_at",
        params![
            record.draw_key,
            record.outlet_code,
            record.region_code,
            record.draw_date.to_string(),
            record.wagered_cents,
            record.cancelled_cents,
            record.refunded_cents,
            record.paid_cents,
            now,
        ],
    )?;

    Ok(if existing.is_some() {
        WriteOutcome::Updated
    } else {
        WriteOutcome::Inserted
    })
}
