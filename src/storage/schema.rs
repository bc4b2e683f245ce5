//! Database schema creation and migrations.

use std::time::Duration;

use rusqlite::{Connection, Result};
use tracing::info;

/// Open the backing store, apply the busy timeout, and make sure the schema
/// exists. One connection per logical operation; dropping it releases the
/// store on every exit path.
pub fn open_store(db_path: &str) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    // Concurrent submitters should queue on the write lock instead of
    // surfacing transient SQLITE_BUSY errors.
    conn.busy_timeout(Duration::from_secs(5))?;
    create_tables(&conn)?;
    info!("[STORAGE] Database ready at {}", db_path);
    Ok(conn)
}

/// Create all database tables and indexes.
pub fn create_tables(conn: &Connection) -> Result<()> {
    // Reference schedule: populated and maintained externally, read-only here
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schedule (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            game_id INTEGER NOT NULL,
            draw_number INTEGER NOT NULL,
            draw_date TEXT NOT NULL,
            modality TEXT NOT NULL,
            UNIQUE (game_id, draw_number)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_schedule_slot
         ON schedule(game_id, draw_date, modality)",
        [],
    )?;

    // Aggregated ledger totals: one row per (draw, outlet)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS outlet_totals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            draw_key TEXT NOT NULL,
            outlet_code TEXT NOT NULL,
            region_code TEXT NOT NULL,
            draw_date TEXT NOT NULL,
            wagered_cents INTEGER NOT NULL,
            cancelled_cents INTEGER NOT NULL,
            refunded_cents INTEGER NOT NULL,
            paid_cents INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            UNIQUE (draw_key, outlet_code)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_outlet_totals_date ON outlet_totals(draw_date)",
        [],
    )?;

    // Official extract records
    conn.execute(
        "CREATE TABLE IF NOT EXISTS extracts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            game_id INTEGER NOT NULL,
            draw_number INTEGER NOT NULL,
            draw_date TEXT NOT NULL,
            region_id INTEGER,
            numbers TEXT NOT NULL,
            letters TEXT,
            source TEXT NOT NULL,
            validated INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
        [],
    )?;

    // A plain UNIQUE index treats NULLs as distinct, which would let
    // NULL-region duplicates through. Two partial indexes give the NULL
    // region its own slot.
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS ux_extracts_key
         ON extracts(game_id, draw_number, draw_date, region_id)
         WHERE region_id IS NOT NULL",
        [],
    )?;
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS ux_extracts_key_null
         ON extracts(game_id, draw_number, draw_date)
         WHERE region_id IS NULL",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_extracts_date ON extracts(draw_date)",
        [],
    )?;

    // Migration: add the validated flag for databases created before it existed
    let _ = conn.execute(
        "ALTER TABLE extracts ADD COLUMN validated INTEGER NOT NULL DEFAULT 0",
        [],
    );

    Ok(())
}
