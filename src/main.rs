//! Draw Ingestion command-line driver.
//!
//! Two commands, one per pipeline:
//!
//! ```text
//! draw-ingest ledger <file>        decode + aggregate + persist a ledger file
//! draw-ingest extract <file.json>  submit a JSON array of extract submissions
//! ```
//!
//! The database path comes from SQLITE_DB_PATH (default `draws.db`).

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use draw_ingest::aggregate::aggregate;
use draw_ingest::catalog::Catalog;
use draw_ingest::config::{db_path, decode_detail_enabled};
use draw_ingest::decoder::decode_all;
use draw_ingest::resolver::ExtractSubmission;
use draw_ingest::storage::{open_store, write_outlet_totals};
use draw_ingest::submission::submit_batch;

fn main() -> Result<()> {
    // Initialize logging with both stdout and file output
    let file_appender = tracing_appender::rolling::never(".", "ingest.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("draw_ingest=info".parse()?);

    let stdout_layer = fmt::layer().with_writer(std::io::stdout);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("ledger") => {
            let path = args
                .get(2)
                .context("Usage: draw-ingest ledger <file>")?;
            run_ledger(path)
        }
        Some("extract") => {
            let path = args
                .get(2)
                .context("Usage: draw-ingest extract <file.json>")?;
            run_extract(path)
        }
        _ => bail!("Usage: draw-ingest ledger <file> | draw-ingest extract <file.json>"),
    }
}

fn run_ledger(path: &str) -> Result<()> {
    info!("📒 Ledger ingestion: {}", path);

    let catalog = Catalog::with_defaults();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read ledger file {}", path))?;

    let (transactions, stats) = decode_all(&catalog, text.lines());
    info!(
        "[DECODE] {} lines accepted, {} skipped",
        stats.accepted,
        stats.skipped()
    );
    if decode_detail_enabled() {
        info!(
            "[DECODE]   too short: {}, sentinel: {}, unknown venue: {}, bad meeting: {}, bad date: {}",
            stats.too_short, stats.sentinel, stats.unknown_venue, stats.bad_meeting, stats.bad_date
        );
    }

    let records = aggregate(transactions);
    info!("[LEDGER] {} (draw, outlet) aggregates", records.len());

    let conn = open_store(&db_path())?;
    let report = write_outlet_totals(&conn, &records);
    info!(
        "[LEDGER] Stored {} records ({} inserted, {} updated)",
        report.written(),
        report.inserted,
        report.updated
    );
    for failure in &report.failures {
        warn!(
            "[LEDGER] ⚠️  {} outlet {}: {}",
            failure.draw_key, failure.outlet_code, failure.reason
        );
    }

    if !report.failures.is_empty() {
        bail!("{} ledger records failed to persist", report.failures.len());
    }
    Ok(())
}

fn run_extract(path: &str) -> Result<()> {
    info!("📋 Extract submission: {}", path);

    let catalog = Catalog::with_defaults();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read submission file {}", path))?;
    let submissions: Vec<ExtractSubmission> =
        serde_json::from_str(&text).context("Submission file must be a JSON array")?;

    let conn = open_store(&db_path())?;
    let report = submit_batch(&conn, &catalog, &submissions);
    info!(
        "[EXTRACT] Batch complete: {} succeeded, {} failed",
        report.succeeded, report.failed
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
