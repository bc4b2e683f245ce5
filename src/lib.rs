//! Lottery Draw Ingestion Core
//!
//! Canonical, deduplicated draw records from two classes of
//! loosely-structured legacy inputs:
//!
//! - **Ledger pipeline**: fixed-width ledger text → [`decoder`] →
//!   [`aggregate`] → idempotent per-(draw, outlet) totals in the store.
//! - **Extract pipeline**: free-form result submissions → [`resolver`]
//!   (identity resolution against the read-only reference schedule) →
//!   validation → idempotent upsert keyed by (game, draw number, date,
//!   region).
//!
//! Both pipelines share one invariant: the same real-world event always
//! collapses to the same stored row, no matter how many times or in what
//! order it is reported.

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod decoder;
pub mod resolver;
pub mod storage;
pub mod submission;
