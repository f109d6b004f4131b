//! Command-line interface definitions for Outbreak Watch.
//!
//! Without a subcommand the full pipeline runs once: collect every enabled
//! source, write the raw snapshot, then normalize, deduplicate and write the
//! final table. `collect` and `process` run either half on its own.

use crate::models::Source;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the Outbreak Watch application.
///
/// # Examples
///
/// ```sh
/// # Collect and process with defaults (raw_data.json, clean_data.csv)
/// outbreak_watch
///
/// # Only hit the feed and the API, with a custom config
/// outbreak_watch collect --only who --only cdc -c outbreak.yaml
///
/// # Rebuild the table from an existing snapshot
/// outbreak_watch process -r ./data/raw_data.json -t ./data/clean_data.csv
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Optional path to a YAML pipeline config
    #[arg(short, long, global = true, env = "OUTBREAK_WATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Where the raw per-source snapshot is written (and read by `process`)
    #[arg(short, long, global = true, default_value = "raw_data.json")]
    pub raw_output: PathBuf,

    /// Where the final CSV table is written
    #[arg(short, long, global = true, default_value = "clean_data.csv")]
    pub table_output: PathBuf,

    /// Restrict collection to these sources (repeatable)
    #[arg(long, global = true, value_enum, ignore_case = true)]
    pub only: Vec<Source>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Command {
    /// Fetch every enabled source and write the raw snapshot
    Collect,
    /// Turn an existing snapshot into the final table
    Process,
    /// Collect, then process
    #[default]
    Run,
}
