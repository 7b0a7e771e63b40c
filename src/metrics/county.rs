//! County Rollup Aggregator.
//!
//! Expands every outlet into `(outlet, county, share)` rows through an
//! [`Allocation`] and folds those rows into one [`CountyMetric`] per county.
//!
//! Only `cfi` is share-weighted. `total_articles` and `avg_posts_per_day`
//! add each covering outlet's full value, so an outlet covering three
//! counties counts in full in all three.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, instrument};

use super::allocation::Allocation;
use crate::models::{CountyFips, CountyMetric, Outlet, OutletMetric};
use crate::utils::median;

#[derive(Debug, Default)]
struct CountyAccumulator<'a> {
    cfi: f64,
    total_articles: u64,
    avg_posts_per_day: f64,
    outlets: HashSet<&'a str>,
    freshness: Vec<f64>,
}

/// Roll outlet metrics up to counties.
///
/// Outlets whose allocation is empty (no covered county) are skipped. An
/// outlet without a metric record is treated as one that never posted.
///
/// # Returns
///
/// One row per county covered by at least one outlet, ordered by
/// `county_fips`, each stamped with `metric_date`.
#[instrument(level = "info", skip_all, fields(outlets = outlets.len(), %metric_date))]
pub fn rollup_counties<A: Allocation>(
    outlets: &[Outlet],
    metrics: &[OutletMetric],
    allocation: &A,
    metric_date: NaiveDate,
) -> Vec<CountyMetric> {
    let by_id: HashMap<&str, &OutletMetric> =
        metrics.iter().map(|m| (m.outlet_id.as_str(), m)).collect();

    let mut counties: BTreeMap<CountyFips, CountyAccumulator> = BTreeMap::new();
    let mut uncovered = 0usize;

    for outlet in outlets {
        let shares = allocation.allocate(outlet);
        if shares.is_empty() {
            uncovered += 1;
            continue;
        }

        let fallback;
        let metric = match by_id.get(outlet.outlet_id.as_str()) {
            Some(m) => *m,
            None => {
                fallback = OutletMetric::empty(outlet.outlet_id.clone());
                &fallback
            }
        };

        for (fips, share) in shares {
            let acc = counties.entry(fips).or_default();
            acc.cfi += metric.avg_posts_per_day * share;
            if acc.outlets.insert(outlet.outlet_id.as_str()) {
                acc.total_articles += metric.total_articles;
                acc.avg_posts_per_day += metric.avg_posts_per_day;
                if let Some(f) = metric.freshness_days {
                    acc.freshness.push(f);
                }
            }
        }
    }

    if uncovered > 0 {
        debug!(uncovered, "Outlets without covered counties excluded from rollup");
    }

    counties
        .into_iter()
        .map(|(county_fips, acc)| CountyMetric {
            county_fips,
            metric_date,
            cfi: acc.cfi,
            total_articles: acc.total_articles,
            outlets_active: acc.outlets.len() as u64,
            avg_posts_per_day: acc.avg_posts_per_day,
            freshness_p50_days: median(&acc.freshness),
        })
        .collect()
}
