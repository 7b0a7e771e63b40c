//! Command-line interface definitions for News Cadence.
//!
//! This module defines the CLI arguments and subcommands using the `clap` crate.
//! Global options can also be provided via environment variables.

use clap::{Args, Parser, Subcommand};

/// Command-line arguments for the News Cadence application.
///
/// # Examples
///
/// ```sh
/// # Load the outlet registry
/// news_cadence load-outlets --csv data/outlets.csv
///
/// # Harvest the last 90 days of articles for one outlet
/// news_cadence harvest --days 90 --only-outlet-id galena-gazette
///
/// # Compute outlet and county metrics over the default 365 day window
/// news_cadence compute --output-dir outputs --json-output-dir public/api
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the SQLite database
    #[arg(long, global = true, env = "NEWS_CADENCE_DB", default_value = "data/news.db")]
    pub db: String,

    /// Optional path to config.yaml file
    #[arg(short, long, global = true, env = "NEWS_CADENCE_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replace the outlet registry from a CSV file
    LoadOutlets {
        /// Registry CSV with outlet_id, name, homepage_url, rss_url, outlet_type, owner, counties_fips
        #[arg(long, default_value = "data/outlets.csv")]
        csv: String,
    },

    /// Fetch article metadata from outlet feeds and sitemaps
    Harvest(HarvestArgs),

    /// Compute outlet metrics and the county rollup
    Compute(ComputeArgs),
}

#[derive(Args, Debug)]
pub struct HarvestArgs {
    /// Trailing window in days; older items are not stored
    #[arg(long, default_value_t = 365, allow_negative_numbers = true)]
    pub days: i64,

    /// Maximum feed or sitemap entries read per outlet
    #[arg(long, default_value_t = 2000)]
    pub max_per_outlet: usize,

    /// Seconds to wait between outlets
    #[arg(long, default_value_t = 1.0)]
    pub throttle: f64,

    /// Harvest only this outlet
    #[arg(long)]
    pub only_outlet_id: Option<String>,
}

#[derive(Args, Debug)]
pub struct ComputeArgs {
    /// Trailing window in days; also the denominator of posts per day
    #[arg(long, default_value_t = 365, allow_negative_numbers = true)]
    pub days: i64,

    /// Output directory for the CSV files
    #[arg(short, long, default_value = "outputs")]
    pub output_dir: String,

    /// Output directory for the dated JSON snapshot
    #[arg(short, long)]
    pub json_output_dir: Option<String>,
}
