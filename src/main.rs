//! # News Cadence
//!
//! Tracks how often local news outlets publish and rolls the result up to
//! county-level metrics for a single state.
//!
//! ## Features
//!
//! - Loads an outlet registry (outlet → covered counties) from CSV
//! - Harvests article metadata from outlet RSS/Atom feeds, falling back to sitemaps
//! - Computes per-outlet cadence: article count, active days, posts per day,
//!   median gap between posts and freshness of the latest post
//! - Rolls outlet cadence up to counties with a share-weighted County Frequency Index
//! - Persists county metrics per date and exports CSV and JSON files
//!
//! ## Usage
//!
//! ```sh
//! news_cadence load-outlets --csv data/outlets.csv
//! news_cadence harvest --days 365
//! news_cadence compute --days 365 -o outputs
//! ```
//!
//! ## Architecture
//!
//! The application follows a batch pipeline architecture:
//! 1. **Registry**: Load outlets and their county coverage into the store
//! 2. **Harvest**: Discover feeds, parse items, store new articles deduplicated by URL hash
//! 3. **Compute**: Snapshot outlets and windowed articles, compute outlet metrics, roll up to counties
//! 4. **Output**: Replace the day's county rows, write CSV files and an optional JSON snapshot

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod config;
mod error;
mod harvest;
mod metrics;
mod models;
mod outputs;
mod pipeline;
mod registry;
mod store;
mod utils;

use cli::{Cli, Command, ComputeArgs, HarvestArgs};
use config::{AppConfig, WindowDays};
use harvest::{HarvestOptions, select_outlets};
use metrics::MetricsRun;
use pipeline::{OutputTargets, run_compute};
use store::Store;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
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
    info!("news_cadence starting up");

    let args = Cli::parse();
    debug!(db = %args.db, config = ?args.config, "Parsed CLI arguments");

    let result = match args.command {
        Command::LoadOutlets { ref csv } => load_outlets(&args.db, csv).await,
        Command::Harvest(ref harvest_args) => {
            run_harvest(&args.db, args.config.as_deref(), harvest_args).await
        }
        Command::Compute(ref compute_args) => compute(&args.db, compute_args).await,
    };

    let elapsed = start_time.elapsed();
    match &result {
        Ok(()) => info!(
            ?elapsed,
            secs = elapsed.as_secs(),
            millis = elapsed.subsec_millis(),
            "Execution complete"
        ),
        Err(e) => error!(?elapsed, error = %e, "Execution failed"),
    }
    result
}

#[instrument(level = "info", skip_all, fields(%csv))]
async fn load_outlets(db: &str, csv: &str) -> Result<(), Box<dyn Error>> {
    // Parse and validate before touching the database.
    let outlets = registry::load_outlets(csv)?;
    let store = Store::open(db).await?;
    store.replace_outlets(&outlets).await?;
    info!(count = outlets.len(), db, "Loaded outlets");
    Ok(())
}

#[instrument(level = "info", skip_all)]
async fn run_harvest(
    db: &str,
    config_path: Option<&str>,
    args: &HarvestArgs,
) -> Result<(), Box<dyn Error>> {
    let window = WindowDays::new(args.days)?;
    let config = AppConfig::load(config_path).await?;
    let options = HarvestOptions {
        window,
        max_per_outlet: args.max_per_outlet,
        throttle: Duration::from_secs_f64(args.throttle.max(0.0)),
        only_outlet_id: args.only_outlet_id.clone(),
    };

    let store = Store::open(db).await?;
    let outlets = select_outlets(store.outlets().await?, options.only_outlet_id.as_deref())?;
    if outlets.is_empty() {
        warn!("Outlet registry is empty; run load-outlets first");
        return Ok(());
    }

    let now = Utc::now();
    let report = harvest::harvest(&store, &outlets, &config.harvest, &options, now).await?;
    info!(
        outlets = report.outlets,
        outlets_with_items = report.outlets_with_items,
        items_in_window = report.items_in_window,
        inserted = report.inserted,
        db,
        "Harvest complete"
    );
    Ok(())
}

#[instrument(level = "info", skip_all, fields(days = args.days))]
async fn compute(db: &str, args: &ComputeArgs) -> Result<(), Box<dyn Error>> {
    // Configuration errors abort before any computation or write.
    let window = WindowDays::new(args.days)?;
    ensure_writable_dir(&args.output_dir).await?;
    if let Some(dir) = &args.json_output_dir {
        ensure_writable_dir(dir).await?;
    }

    let store = Store::open(db).await?;
    let targets = OutputTargets {
        output_dir: args.output_dir.clone(),
        json_output_dir: args.json_output_dir.clone(),
    };

    let now = Utc::now();
    match run_compute(&store, window, &targets, now).await? {
        MetricsRun::NothingComputed(reason) => {
            info!(reason = reason.describe(), "Nothing to compute yet");
        }
        MetricsRun::Computed { snapshot, .. } => {
            info!(
                output_dir = %targets.output_dir,
                metric_date = %snapshot.metric_date,
                "Wrote county_metrics.csv and outlet_metrics.csv"
            );
        }
    }
    Ok(())
}
