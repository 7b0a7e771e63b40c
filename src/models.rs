//! Data models for outlets, articles and the derived cadence metrics.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Outlet`]: Static registry entry for one news outlet
//! - [`ArticleRecord`]: One stored article as read back from the article store
//! - [`FeedItem`]: A harvested feed or sitemap entry before it is stored
//! - [`OutletMetric`]: Per-outlet cadence statistics for one run
//! - [`CountyMetric`]: Per-county rollup for one metric date
//!
//! Undefined statistics (a median gap with fewer than two articles, the
//! freshness of an outlet that never posted) are `None`, never `0.0` and
//! never `NaN`. They serialize as an empty CSV cell or a JSON `null`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A county identifier, usually a five digit FIPS code such as `"17031"`.
pub type CountyFips = String;

/// A news outlet as loaded from the outlet registry.
///
/// `counties_fips` keeps the registry order and is already deduplicated.
/// An empty list means the outlet covers no county and is excluded from
/// every county rollup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlet {
    /// Unique registry key.
    pub outlet_id: String,
    /// Display name.
    pub name: String,
    /// Homepage used for feed discovery and link canonicalization.
    pub homepage_url: String,
    /// Known feed URL; `None` triggers discovery during harvest.
    pub rss_url: Option<String>,
    /// Free-form outlet type (e.g. "newspaper", "radio").
    pub outlet_type: String,
    /// Owning organization.
    pub owner: String,
    /// Counties covered by this outlet.
    pub counties_fips: Vec<CountyFips>,
}

/// An article row as read back from the store.
///
/// `published_at` is kept as text: the calculator normalizes it and
/// discards the article when it does not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    pub outlet_id: String,
    pub published_at: String,
}

/// Where a harvested item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemSource {
    Rss,
    Sitemap,
}

impl ItemSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemSource::Rss => "rss",
            ItemSource::Sitemap => "sitemap",
        }
    }
}

/// A single entry discovered in an outlet's feed or sitemap.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
}

/// Cadence statistics for one outlet over the trailing window.
///
/// One record exists per registry outlet for every run, whether or not the
/// outlet published anything in the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutletMetric {
    pub outlet_id: String,
    /// Number of articles in the window.
    pub total_articles: u64,
    /// Distinct UTC calendar dates with at least one article.
    pub days_active: u64,
    /// `total_articles / window_days`, normalized against the full window.
    pub avg_posts_per_day: f64,
    /// Median of consecutive publish deltas in days. `None` below two articles.
    pub median_gap_days: Option<f64>,
    /// Days between the run snapshot and the latest article. `None` without articles.
    pub freshness_days: Option<f64>,
}

impl OutletMetric {
    /// The record reported for an outlet with no qualifying articles.
    pub fn empty(outlet_id: impl Into<String>) -> Self {
        Self {
            outlet_id: outlet_id.into(),
            total_articles: 0,
            days_active: 0,
            avg_posts_per_day: 0.0,
            median_gap_days: None,
            freshness_days: None,
        }
    }
}

/// County-level rollup for one metric date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyMetric {
    pub county_fips: CountyFips,
    pub metric_date: NaiveDate,
    /// County Frequency Index: share-weighted sum of posts per day.
    pub cfi: f64,
    /// Unweighted sum of covering outlets' article counts.
    pub total_articles: u64,
    /// Distinct outlets covering the county.
    pub outlets_active: u64,
    /// Unweighted sum of covering outlets' posts per day.
    pub avg_posts_per_day: f64,
    /// Median of the defined freshness values of covering outlets.
    pub freshness_p50_days: Option<f64>,
}

/// Everything one metrics run hands to the sinks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub generated_at: DateTime<Utc>,
    pub metric_date: NaiveDate,
    pub window_days: u32,
    pub outlets: Vec<OutletMetric>,
    pub counties: Vec<CountyMetric>,
}
