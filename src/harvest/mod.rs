//! Article harvesting from outlet feeds and sitemaps.
//!
//! Each outlet goes through the same best-effort sequence:
//!
//! 1. **Feed**: the registered `rss_url`, or one found by [`discover`]
//! 2. **Fallback**: the outlet's `/sitemap.xml` when the feed yields nothing
//! 3. **Filter**: keep items published inside the trailing window
//! 4. **Store**: canonicalize, hash and insert, skipping known hashes
//!
//! # Submodules
//!
//! | Module | Role |
//! |--------|------|
//! | [`http`] | Shared client, retry-free GETs |
//! | [`discover`] | Well-known paths and `<link rel="alternate">` lookup |
//! | [`feed`] | RSS 2.0 / Atom parsing |
//! | [`sitemap`] | `urlset` / `sitemapindex` parsing |
//!
//! Failures are logged and the outlet is skipped; nothing here aborts a run
//! except a storage error.

pub mod discover;
pub mod feed;
pub mod http;
pub mod sitemap;

use chrono::{DateTime, TimeDelta, Utc};
use std::error::Error;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::config::{HarvestConfig, WindowDays};
use crate::error::CadenceError;
use crate::models::{FeedItem, ItemSource, Outlet};
use crate::store::Store;
use crate::utils::{truncate_for_log, url_hash};
use discover::{canonicalize_url, discover_feed};
use http::Fetcher;

/// Per-run harvest settings from the command line.
#[derive(Debug, Clone)]
pub struct HarvestOptions {
    pub window: WindowDays,
    pub max_per_outlet: usize,
    pub throttle: Duration,
    pub only_outlet_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestReport {
    pub outlets: usize,
    pub outlets_with_items: usize,
    pub items_in_window: usize,
    pub inserted: usize,
}

/// Keep items published within the last `window` days of `now`.
///
/// Undated items are dropped: without a timestamp they cannot feed cadence
/// metrics.
pub fn select_recent(items: Vec<FeedItem>, window: WindowDays, now: DateTime<Utc>) -> Vec<FeedItem> {
    let cutoff = now - TimeDelta::days(window.get() as i64);
    items
        .into_iter()
        .filter(|it| it.published.is_some_and(|ts| ts >= cutoff))
        .collect()
}

/// Restrict the registry to one outlet when asked to.
pub fn select_outlets(outlets: Vec<Outlet>, only: Option<&str>) -> Result<Vec<Outlet>, CadenceError> {
    let Some(id) = only else {
        return Ok(outlets);
    };
    let selected: Vec<Outlet> = outlets.into_iter().filter(|o| o.outlet_id == id).collect();
    if selected.is_empty() {
        return Err(CadenceError::OutletNotFound { outlet_id: id.to_string() });
    }
    Ok(selected)
}

/// Fetch feed items for one outlet, falling back to its sitemap.
#[instrument(level = "info", skip_all, fields(outlet_id = %outlet.outlet_id))]
async fn collect_items(
    fetcher: &Fetcher,
    config: &HarvestConfig,
    outlet: &Outlet,
    max_items: usize,
) -> (Vec<FeedItem>, ItemSource) {
    let feed_url = match &outlet.rss_url {
        Some(url) => Some(url.clone()),
        None => discover_feed(fetcher, &outlet.homepage_url, &config.feed_candidates).await,
    };

    if let Some(url) = feed_url {
        if let Some(page) = fetcher.get(&url).await {
            match feed::parse_feed(&page.body, max_items) {
                Ok(items) if !items.is_empty() => {
                    debug!(%url, count = items.len(), "Parsed feed");
                    return (items, ItemSource::Rss);
                }
                Ok(_) => debug!(%url, "Feed had no items"),
                Err(e) => warn!(
                    %url,
                    error = %e,
                    body_preview = %truncate_for_log(&page.body, 200),
                    "Feed did not parse"
                ),
            }
        }
    }

    let items = sitemap::harvest_sitemap(
        fetcher,
        &outlet.homepage_url,
        max_items,
        config.max_child_sitemaps,
    )
    .await;
    (items, ItemSource::Sitemap)
}

/// Canonicalize, hash and insert one outlet's items.
///
/// Links that cannot be resolved against the homepage and undated items are
/// skipped. Returns the number of rows actually written; known hashes count
/// as zero.
pub async fn store_items(
    store: &Store,
    outlet: &Outlet,
    items: &[FeedItem],
    source: ItemSource,
) -> Result<usize, CadenceError> {
    let mut inserted = 0usize;
    for item in items {
        let Some(link) = canonicalize_url(&outlet.homepage_url, &item.link) else {
            debug!(outlet_id = %outlet.outlet_id, link = %truncate_for_log(&item.link, 120), "Skipping unresolvable link");
            continue;
        };
        let Some(published) = item.published else {
            continue;
        };
        let hash = url_hash(&link);
        if store
            .insert_article(&outlet.outlet_id, &link, &item.title, &published, source, &hash)
            .await?
        {
            inserted += 1;
        }
    }
    Ok(inserted)
}

/// Harvest every outlet in turn, sleeping `throttle` between outlets.
#[instrument(level = "info", skip_all, fields(outlets = outlets.len()))]
pub async fn harvest(
    store: &Store,
    outlets: &[Outlet],
    config: &HarvestConfig,
    options: &HarvestOptions,
    now: DateTime<Utc>,
) -> Result<HarvestReport, Box<dyn Error>> {
    let fetcher = Fetcher::new(config)?;
    let mut report = HarvestReport {
        outlets: outlets.len(),
        ..Default::default()
    };

    for outlet in outlets {
        let (items, source) = collect_items(&fetcher, config, outlet, options.max_per_outlet).await;
        let recent = select_recent(items, options.window, now);

        if recent.is_empty() {
            info!(outlet_id = %outlet.outlet_id, "No recent items");
            sleep(options.throttle).await;
            continue;
        }
        report.outlets_with_items += 1;
        report.items_in_window += recent.len();

        let inserted = store_items(store, outlet, &recent, source).await?;

        info!(
            outlet_id = %outlet.outlet_id,
            source = source.as_str(),
            items = recent.len(),
            inserted,
            "Harvested outlet"
        );
        report.inserted += inserted;
        sleep(options.throttle).await;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(link: &str, published: Option<DateTime<Utc>>) -> FeedItem {
        FeedItem {
            title: String::new(),
            link: link.into(),
            published,
        }
    }

    fn outlet(id: &str) -> Outlet {
        Outlet {
            outlet_id: id.into(),
            name: id.into(),
            homepage_url: format!("https://{id}.example"),
            rss_url: None,
            outlet_type: String::new(),
            owner: String::new(),
            counties_fips: vec![],
        }
    }

    #[test]
    fn test_select_recent() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let window = WindowDays::new(10).unwrap();
        let items = vec![
            item("old", Some(now - TimeDelta::days(11))),
            item("edge", Some(now - TimeDelta::days(10))),
            item("new", Some(now - TimeDelta::hours(2))),
            item("undated", None),
        ];
        let kept: Vec<_> = select_recent(items, window, now)
            .into_iter()
            .map(|i| i.link)
            .collect();
        assert_eq!(kept, vec!["edge", "new"]);
    }

    #[test]
    fn test_select_outlets() {
        let all = vec![outlet("a"), outlet("b")];
        assert_eq!(select_outlets(all.clone(), None).unwrap().len(), 2);

        let only = select_outlets(all.clone(), Some("b")).unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].outlet_id, "b");

        let err = select_outlets(all, Some("zzz")).unwrap_err();
        assert!(matches!(err, CadenceError::OutletNotFound { .. }));
    }

    #[tokio::test]
    async fn test_store_items_canonicalizes_and_dedupes() {
        let store = Store::in_memory().await.unwrap();
        let galena = outlet("galena");
        store.replace_outlets(std::slice::from_ref(&galena)).await.unwrap();

        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let items = vec![
            item("/2025/05/31/budget", Some(now - TimeDelta::days(1))),
            item("news/fair", Some(now - TimeDelta::days(2))),
            item("https://galena.example/2025/05/31/budget", Some(now - TimeDelta::days(1))),
            item("https://[broken", Some(now - TimeDelta::days(3))),
            item("   ", Some(now - TimeDelta::days(3))),
            item("/undated", None),
        ];

        let inserted = store_items(&store, &galena, &items, ItemSource::Rss).await.unwrap();
        assert_eq!(inserted, 2);

        let (start, end) = WindowDays::new(30).unwrap().bounds(now);
        let stored = store.articles_in_window(start, end).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|a| a.outlet_id == "galena"));

        let again = store_items(&store, &galena, &items, ItemSource::Sitemap).await.unwrap();
        assert_eq!(again, 0);
        assert_eq!(store.articles_in_window(start, end).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_harvest_with_no_outlets_reports_zero() {
        let store = Store::in_memory().await.unwrap();
        let options = HarvestOptions {
            window: WindowDays::new(30).unwrap(),
            max_per_outlet: 10,
            throttle: Duration::ZERO,
            only_outlet_id: None,
        };
        let report = harvest(&store, &[], &HarvestConfig::default(), &options, Utc::now())
            .await
            .unwrap();
        assert_eq!(report, HarvestReport::default());
    }
}
