//! Single and batch extract submission: validate, resolve, persist.
//!
//! Batch items are processed strictly sequentially. That is a deliberate
//! isolation mechanism: one item's failure can never corrupt or abort its
//! siblings, and error attribution is always exactly one item.

use rusqlite::Connection;
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::DEFAULT_SOURCE_TAG;
use crate::resolver::{resolve_identity, ExtractSubmission, SubmitError};
use crate::storage::extract::{upsert_extract, ExtractPayload, SqliteSchedule};

/// Outcome of one successful submission.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SubmitReceipt {
    pub id: i64,
    pub created: bool,
    /// Resolved draw number; 0 means the resolution was degraded
    pub draw_number: u32,
    pub degraded: bool,
}

/// Submit one extract: shape validation, identity resolution, idempotent
/// upsert. Nothing is written when validation or resolution rejects.
pub fn submit_extract(
    conn: &Connection,
    catalog: &Catalog,
    submission: &ExtractSubmission,
) -> Result<SubmitReceipt, SubmitError> {
    let schedule = SqliteSchedule::new(conn);
    let identity = resolve_identity(catalog, &schedule, submission)?;

    let payload = ExtractPayload {
        numbers: submission.numbers.join(" "),
        letters: submission.letters.clone(),
        source: submission
            .source
            .clone()
            .unwrap_or_else(|| DEFAULT_SOURCE_TAG.to_string()),
    };

    let outcome =
        upsert_extract(conn, &identity, &payload).map_err(|e| SubmitError::Store(e.to_string()))?;

    info!(
        "[EXTRACT] {} extract {} for game {} draw {} on {}",
        if outcome.created { "Stored" } else { "Updated" },
        outcome.id,
        identity.game_id,
        identity.draw_number,
        identity.draw_date
    );

    Ok(SubmitReceipt {
        id: outcome.id,
        created: outcome.created,
        draw_number: identity.draw_number,
        degraded: identity.degraded,
    })
}

/// Per-item result in a batch report: either the stored row or the error
/// with an echo of the item that caused it.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ItemOutcome {
    Stored {
        id: i64,
        created: bool,
        updated: bool,
    },
    Failed {
        error: String,
        item: ExtractSubmission,
    },
}

/// Aggregate outcome of one batch call. `items` preserves submission order.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
    pub items: Vec<ItemOutcome>,
}

/// Submit a batch of extracts, strictly in order, never aborting early.
pub fn submit_batch(
    conn: &Connection,
    catalog: &Catalog,
    submissions: &[ExtractSubmission],
) -> BatchReport {
    let mut report = BatchReport {
        succeeded: 0,
        failed: 0,
        items: Vec::with_capacity(submissions.len()),
    };

    for submission in submissions {
        match submit_extract(conn, catalog, submission) {
            Ok(receipt) => {
                report.succeeded += 1;
                report.items.push(ItemOutcome::Stored {
                    id: receipt.id,
                    created: receipt.created,
                    updated: !receipt.created,
                });
            }
            Err(e) => {
                warn!("[EXTRACT] Batch item rejected ({}): {}", submission.game, e);
                report.failed += 1;
                report.items.push(ItemOutcome::Failed {
                    error: e.to_string(),
                    item: submission.clone(),
                });
            }
        }
    }

    report
}
