#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the `FindMyPark` data loader.
//!
//! Loads parks, then athletic facilities, then trails from the NYC Open
//! Data CSV exports into a `DuckDB` database and prints a summary.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use findmypark_cli_utils::IndicatifProgress;
use findmypark_database::{DuckDbStore, MemoryStore, ParkStore};
use findmypark_ingest::config::load_config;
use findmypark_ingest::error_chain;
use findmypark_ingest::pipeline::{Pipeline, ProgressFactory};
use findmypark_ingest::report::render_summary;
use findmypark_ingest_models::progress::ProgressCallback;
use findmypark_ingest_models::{Dataset, ImportConfig, RunSummary};

#[derive(Parser)]
#[command(
    name = "findmypark_ingest",
    about = "Load NYC park, facility, and trail datasets into the FindMyPark database"
)]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// `DuckDB` database file (overrides the config file)
    #[arg(long)]
    database: Option<PathBuf>,
    /// Directory containing the source CSV files (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Create the Park, Facility, and Trail tables if they do not exist
    #[arg(long)]
    init_schema: bool,
    /// Load into memory only; the database is not opened
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = findmypark_cli_utils::init_logger();
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database = database;
    }
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    let progress = |dataset: Dataset| -> Arc<dyn ProgressCallback> {
        IndicatifProgress::records_bar(&multi, &format!("Loading {dataset}"))
    };

    let start = Instant::now();
    let summary = if cli.dry_run {
        log::info!(
            "Dry run: loading into memory, {} is not touched",
            config.database.display()
        );
        let mut store = MemoryStore::new();
        load(&mut store, &config, &progress)
    } else {
        let mut store = match DuckDbStore::open(&config.database, cli.init_schema) {
            Ok(store) => store,
            Err(e) => {
                log::error!(
                    "Failed to open database {}: {e}",
                    config.database.display()
                );
                return Err(e.into());
            }
        };
        log::info!("Connected to {}", config.database.display());

        let summary = load(&mut store, &config, &progress);

        match store.close() {
            Ok(()) => log::info!("Database disconnected"),
            Err(e) => log::error!("Failed to close database: {e}"),
        }
        summary
    };

    println!("{}", render_summary(&summary));
    log::info!("Finished in {:.1}s", start.elapsed().as_secs_f64());

    Ok(())
}

/// Runs the pipeline, logging a failure instead of propagating it so the
/// completed passes are still reported.
fn load(
    store: &mut dyn ParkStore,
    config: &ImportConfig,
    progress: ProgressFactory<'_>,
) -> RunSummary {
    let mut pipeline = Pipeline::new(config);
    if let Err(e) = pipeline.run(store, progress) {
        log::error!("Load aborted: {}", error_chain(&e));
    }
    pipeline.into_summary()
}
