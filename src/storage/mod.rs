//! SQLite persistence for ledger totals, extract records, and the
//! read-only reference schedule.

pub mod extract;
pub mod ledger;
pub mod schema;

pub use extract::{upsert_extract, ExtractPayload, SqliteSchedule, UpsertOutcome};
pub use ledger::{write_outlet_totals, LedgerWriteFailure, LedgerWriteReport, WriteOutcome};
pub use schema::{create_tables, open_store};
