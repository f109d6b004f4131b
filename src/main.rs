//! # Outbreak Watch
//!
//! Collects disease-outbreak mentions from four public sources, keeps the
//! ones that mention an outbreak keyword, and writes one deduplicated table.
//!
//! ## Sources
//!
//! - WHO news RSS feed
//! - CDC media JSON API
//! - HealthMap's JavaScript-rendered outbreak map
//! - Wikipedia's current-events portal
//!
//! ## Usage
//!
//! ```sh
//! outbreak_watch -r ./data/raw_data.json -t ./data/clean_data.csv
//! ```
//!
//! ## Architecture
//!
//! 1. **Collection**: each source is fetched, parsed by its adapter and
//!    relevance-filtered; a failing source degrades to an empty result
//! 2. **Snapshot**: per-source raw records are written as JSON
//! 3. **Normalization**: records are mapped into the unified schema
//! 4. **Finalization**: duplicates are dropped, dates are typed, and the
//!    table is written as CSV

use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod collector;
mod config;
mod error;
mod finalize;
mod models;
mod normalize;
mod orchestrator;
mod outputs;
mod relevance;
mod scrapers;
mod transport;
mod utils;

use cli::{Cli, Command};
use config::PipelineConfig;
use models::Snapshot;
use orchestrator::IngestionOrchestrator;
use outputs::json;
use transport::HttpTransport;
use utils::ensure_writable_parent;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("outbreak_watch starting up");

    let args = Cli::parse();
    let command = args.command.unwrap_or_default();
    info!(?command, raw_output = %args.raw_output.display(), table_output = %args.table_output.display(), "Parsed CLI arguments");

    let config = match PipelineConfig::load(args.config.as_deref()) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!(error = %e, "Configuration rejected");
            return Err(e.into());
        }
    };

    // Fail on unwritable outputs before any network work.
    let mut targets = Vec::new();
    if command != Command::Process {
        targets.push(args.raw_output.as_path());
    }
    if command != Command::Collect {
        targets.push(args.table_output.as_path());
    }
    for path in targets {
        if let Err(e) = ensure_writable_parent(path).await {
            error!(path = %path.display(), error = %e, "Output location is not writable");
            return Err(e);
        }
    }

    let snapshot = match command {
        Command::Collect | Command::Run => collect(&args, config).await?,
        Command::Process => match json::load_snapshot(&args.raw_output).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(path = %args.raw_output.display(), error = %e, "Failed to load snapshot");
                return Err(e.into());
            }
        },
    };

    if command != Command::Collect {
        process(&snapshot, &args.table_output).await?;
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

/// Run every enabled collector and persist the raw snapshot.
#[instrument(level = "info", skip_all)]
async fn collect(args: &Cli, config: Arc<PipelineConfig>) -> Result<Snapshot, Box<dyn Error>> {
    let enabled = config.enabled_sources(&args.only);
    if enabled.is_empty() {
        warn!("No sources enabled; the snapshot will be empty");
    }
    info!(sources = ?enabled, "Collecting");

    let transport = HttpTransport::new(&config)?;
    let snapshot = IngestionOrchestrator::new(transport, config).run(&enabled).await;

    if let Err(e) = json::write_snapshot(&snapshot, &args.raw_output).await {
        error!(path = %args.raw_output.display(), error = %e, "Failed to write snapshot");
        return Err(e.into());
    }
    Ok(snapshot)
}

/// Normalize, deduplicate and persist the final table.
#[instrument(level = "info", skip_all)]
async fn process(snapshot: &Snapshot, table_output: &Path) -> Result<(), Box<dyn Error>> {
    let rows = finalize::finalize(normalize::normalize(snapshot));
    if let Err(e) = outputs::csv::write_table(&rows, table_output).await {
        error!(path = %table_output.display(), error = %e, "Failed to write final table");
        return Err(e.into());
    }
    info!(rows = rows.len(), path = %table_output.display(), "Clean data saved");
    Ok(())
}
