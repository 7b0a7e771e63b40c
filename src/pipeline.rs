//! End-to-end metrics run: store snapshot in, store table and files out.
//!
//! Ordering matters for failure semantics. Everything that can fail for
//! configuration reasons (window, output directory) is checked before the
//! snapshot is read, and the county table is replaced in a single
//! transaction before the flat files are written.

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use crate::config::WindowDays;
use crate::error::Result;
use crate::metrics::{self, MetricsRun};
use crate::outputs::{json, tables};
use crate::store::Store;

/// Where a metrics run writes its files.
#[derive(Debug, Clone)]
pub struct OutputTargets {
    pub output_dir: String,
    pub json_output_dir: Option<String>,
}

/// Read the snapshot, compute, then persist and export.
///
/// `now` is captured once by the caller and used for the article window,
/// every freshness value and the metric date.
#[instrument(level = "info", skip_all, fields(window = window.get(), %now))]
pub async fn run_compute(
    store: &Store,
    window: WindowDays,
    targets: &OutputTargets,
    now: DateTime<Utc>,
) -> Result<MetricsRun> {
    let outlets = store.outlets().await?;
    let (start, end) = window.bounds(now);
    let articles = store.articles_in_window(start, end).await?;

    let run = metrics::compute(&outlets, &articles, window, now);
    match &run {
        MetricsRun::NothingComputed(reason) => {
            warn!(reason = reason.describe(), "Nothing computed; no output written");
        }
        MetricsRun::Computed { snapshot, signals } => {
            for signal in signals {
                warn!(signal = signal.describe(), "Empty input");
            }
            store
                .replace_county_metrics(snapshot.metric_date, &snapshot.counties)
                .await?;
            tables::write_county_metrics(&targets.output_dir, &snapshot.counties).await?;
            tables::write_outlet_metrics(&targets.output_dir, &snapshot.outlets).await?;
            if let Some(dir) = &targets.json_output_dir {
                json::write_snapshot(snapshot, dir).await?;
            }
            info!(
                outlets = snapshot.outlets.len(),
                counties = snapshot.counties.len(),
                metric_date = %snapshot.metric_date,
                "Metrics published"
            );
        }
    }
    Ok(run)
}
