//! Cadence metrics engine.
//!
//! # Submodules
//!
//! - [`outlet`]: Per-outlet statistics over the trailing window
//! - [`county`]: Share-weighted rollup of outlet statistics to counties
//! - [`allocation`]: How an outlet's cadence is split across its counties
//!
//! [`compute`] runs both stages against one snapshot instant and reports
//! empty-input conditions next to the results.

pub mod allocation;
pub mod county;
pub mod outlet;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::config::WindowDays;
use crate::models::{ArticleRecord, MetricsSnapshot, Outlet};
use allocation::EqualSplit;

/// Conditions under which a run is valid but has little or nothing to say.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyInput {
    /// The registry has no outlets; nothing is computed or written.
    NoOutlets,
    /// No article in the window had a usable timestamp; outlet rows are zero-filled.
    NoArticlesInWindow,
    /// No outlet covers a county; the county rollup is empty.
    NoCoveredCounties,
}

impl EmptyInput {
    pub fn describe(&self) -> &'static str {
        match self {
            EmptyInput::NoOutlets => "no outlets in the registry; nothing to compute yet",
            EmptyInput::NoArticlesInWindow => "no articles in the window; outlet metrics are zero-filled",
            EmptyInput::NoCoveredCounties => "no outlet covers a county; county metrics are empty",
        }
    }
}

/// Outcome of one metrics run.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricsRun {
    /// Metrics were computed. `signals` lists any empty-input conditions.
    Computed {
        snapshot: MetricsSnapshot,
        signals: Vec<EmptyInput>,
    },
    /// Nothing was computed and nothing should be written.
    NothingComputed(EmptyInput),
}

/// Compute outlet metrics and the county rollup for one run.
///
/// `now` is the single snapshot instant used for every freshness value and
/// for the metric date.
#[instrument(level = "info", skip_all, fields(window = window.get(), %now))]
pub fn compute(
    outlets: &[Outlet],
    articles: &[ArticleRecord],
    window: WindowDays,
    now: DateTime<Utc>,
) -> MetricsRun {
    if outlets.is_empty() {
        info!("{}", EmptyInput::NoOutlets.describe());
        return MetricsRun::NothingComputed(EmptyInput::NoOutlets);
    }

    let metric_date = now.date_naive();
    let outlet_metrics = outlet::compute_outlet_metrics(outlets, articles, window, now);
    let county_metrics = county::rollup_counties(outlets, &outlet_metrics, &EqualSplit, metric_date);

    let mut signals = Vec::new();
    if outlet_metrics.iter().all(|m| m.total_articles == 0) {
        signals.push(EmptyInput::NoArticlesInWindow);
    }
    if county_metrics.is_empty() {
        signals.push(EmptyInput::NoCoveredCounties);
    }

    info!(
        outlets = outlet_metrics.len(),
        counties = county_metrics.len(),
        signals = signals.len(),
        "Computed cadence metrics"
    );

    MetricsRun::Computed {
        snapshot: MetricsSnapshot {
            generated_at: now,
            metric_date,
            window_days: window.get(),
            outlets: outlet_metrics,
            counties: county_metrics,
        },
        signals,
    }
}
