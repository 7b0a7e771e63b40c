//! Outlet Metrics Calculator.
//!
//! Turns the articles of one window into one [`OutletMetric`] per registry
//! outlet. Outlets with no usable article get [`OutletMetric::empty`].

use chrono::{DateTime, NaiveDate, Utc};
use itertools::Itertools;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument, warn};

use crate::config::WindowDays;
use crate::models::{ArticleRecord, Outlet, OutletMetric};
use crate::utils::{delta_days, median, parse_timestamp};

/// Compute per-outlet cadence statistics.
///
/// `articles` are expected to already fall inside the window. Articles whose
/// timestamp does not parse are dropped individually; articles for an
/// outlet_id that is not in the registry are ignored.
///
/// # Returns
///
/// Exactly one record per entry of `outlets`, in registry order.
#[instrument(level = "info", skip_all, fields(outlets = outlets.len(), articles = articles.len(), window = window.get()))]
pub fn compute_outlet_metrics(
    outlets: &[Outlet],
    articles: &[ArticleRecord],
    window: WindowDays,
    now: DateTime<Utc>,
) -> Vec<OutletMetric> {
    let mut dropped = 0usize;
    let parsed: Vec<(&str, DateTime<Utc>)> = articles
        .iter()
        .filter_map(|a| match parse_timestamp(&a.published_at) {
            Some(ts) => Some((a.outlet_id.as_str(), ts)),
            None => {
                dropped += 1;
                debug!(outlet_id = %a.outlet_id, published_at = %a.published_at, "Dropping article with unparseable timestamp");
                None
            }
        })
        .collect();
    if dropped > 0 {
        warn!(dropped, "Discarded articles with unparseable timestamps");
    }

    let by_outlet: HashMap<&str, Vec<DateTime<Utc>>> = parsed.into_iter().into_group_map();

    let known: HashSet<&str> = outlets.iter().map(|o| o.outlet_id.as_str()).collect();
    let orphans = by_outlet.keys().filter(|id| !known.contains(*id)).count();
    if orphans > 0 {
        debug!(orphans, "Articles reference outlets missing from the registry");
    }

    outlets
        .iter()
        .map(|outlet| match by_outlet.get(outlet.outlet_id.as_str()) {
            Some(stamps) => outlet_metric(&outlet.outlet_id, stamps, window, now),
            None => OutletMetric::empty(outlet.outlet_id.clone()),
        })
        .collect()
}

fn outlet_metric(
    outlet_id: &str,
    stamps: &[DateTime<Utc>],
    window: WindowDays,
    now: DateTime<Utc>,
) -> OutletMetric {
    let mut sorted = stamps.to_vec();
    sorted.sort();

    let total_articles = sorted.len() as u64;
    // The query bounds carry a day of clock-skew slack on top of the window,
    // so distinct dates can exceed it by up to two.
    let days_active = (sorted
        .iter()
        .map(|ts| ts.date_naive())
        .collect::<HashSet<NaiveDate>>()
        .len() as u64)
        .min(window.get() as u64);

    let gaps: Vec<f64> = sorted
        .iter()
        .tuple_windows()
        .map(|(a, b)| delta_days(*b - *a))
        .collect();

    OutletMetric {
        outlet_id: outlet_id.to_string(),
        total_articles,
        days_active,
        avg_posts_per_day: total_articles as f64 / window.get() as f64,
        median_gap_days: median(&gaps),
        freshness_days: sorted.last().map(|latest| delta_days(now - *latest)),
    }
}
