//! System configuration and environment parsing.

use std::sync::OnceLock;

/// Default SQLite database path when SQLITE_DB_PATH is not set
pub const DEFAULT_DB_PATH: &str = "draws.db";

/// Source tag recorded when a submission does not name its origin
pub const DEFAULT_SOURCE_TAG: &str = "manual/ocr";

/// Database path from SQLITE_DB_PATH
pub fn db_path() -> String {
    std::env::var("SQLITE_DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string())
}

/// Per-reason decode skip breakdown in the ingest summary (set DECODE_DETAIL=1 to enable)
/// Default: false (only the aggregate accepted/skipped counts are logged)
pub fn decode_detail_enabled() -> bool {
    static CACHED: OnceLock<bool> = OnceLock::new();
    *CACHED.get_or_init(|| {
        std::env::var("DECODE_DETAIL")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false)
    })
}
