//! SQLite-backed article store, outlet registry table and county metrics table.
//!
//! # Tables
//!
//! - `outlets`: the registry, replaced wholesale by `load-outlets`
//! - `articles`: append-only, deduplicated by the hash of the canonical URL
//! - `county_metrics`: one row per `(county_fips, metric_date)`
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC text (see
//! [`format_timestamp`]) so the window predicate is a plain text comparison.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    Pool, Row, Sqlite,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::models::{ArticleRecord, CountyMetric, ItemSource, Outlet};
use crate::utils::{format_timestamp, join_county_list, parse_county_list};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS outlets (
    outlet_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    homepage_url TEXT NOT NULL,
    rss_url TEXT,
    outlet_type TEXT NOT NULL,
    owner TEXT NOT NULL,
    counties_fips TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    outlet_id TEXT NOT NULL,
    url TEXT NOT NULL,
    title TEXT NOT NULL,
    published_at TEXT NOT NULL,
    source TEXT NOT NULL,
    retrieved_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    hash TEXT NOT NULL UNIQUE
);
CREATE INDEX IF NOT EXISTS idx_articles_published_at ON articles (published_at);

CREATE TABLE IF NOT EXISTS county_metrics (
    county_fips TEXT NOT NULL,
    metric_date TEXT NOT NULL,
    cfi REAL NOT NULL,
    total_articles INTEGER NOT NULL,
    outlets_active INTEGER NOT NULL,
    avg_posts_per_day REAL NOT NULL,
    freshness_p50_days REAL,
    PRIMARY KEY (county_fips, metric_date)
);
"#;

#[derive(Clone, Debug)]
pub struct Store {
    pool: Pool<Sqlite>,
}

impl Store {
    /// Open (creating if needed) the database file at `path`.
    #[instrument(level = "info")]
    pub async fn open(path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        info!("Database pool created");

        let store = Store { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// A private in-memory database. One connection, kept open for the
    /// lifetime of the pool so the data survives between queries.
    #[cfg_attr(not(test), allow(dead_code))]
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let store = Store { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        debug!("Tables ensured to exist");
        Ok(())
    }

    /// Replace the whole registry in one transaction.
    #[instrument(level = "info", skip_all, fields(count = outlets.len()))]
    pub async fn replace_outlets(&self, outlets: &[Outlet]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM outlets").execute(&mut *tx).await?;
        for outlet in outlets {
            sqlx::query(
                r#"
                INSERT INTO outlets (outlet_id, name, homepage_url, rss_url, outlet_type, owner, counties_fips)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&outlet.outlet_id)
            .bind(&outlet.name)
            .bind(&outlet.homepage_url)
            .bind(outlet.rss_url.as_deref())
            .bind(&outlet.outlet_type)
            .bind(&outlet.owner)
            .bind(join_county_list(&outlet.counties_fips))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        info!("Outlet registry replaced");
        Ok(())
    }

    /// The full registry, in load order.
    pub async fn outlets(&self) -> Result<Vec<Outlet>> {
        let rows = sqlx::query(
            "SELECT outlet_id, name, homepage_url, rss_url, outlet_type, owner, counties_fips FROM outlets ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut outlets = Vec::with_capacity(rows.len());
        for row in rows {
            let rss_url: Option<String> = row.try_get("rss_url")?;
            let counties: String = row.try_get("counties_fips")?;
            outlets.push(Outlet {
                outlet_id: row.try_get("outlet_id")?,
                name: row.try_get("name")?,
                homepage_url: row.try_get("homepage_url")?,
                rss_url: rss_url.filter(|u| !u.trim().is_empty()),
                outlet_type: row.try_get("outlet_type")?,
                owner: row.try_get("owner")?,
                counties_fips: parse_county_list(&counties),
            });
        }
        Ok(outlets)
    }

    /// Insert one article unless its hash is already present.
    ///
    /// # Returns
    ///
    /// `true` when a new row was written.
    #[instrument(level = "debug", skip(self, title, hash))]
    pub async fn insert_article(
        &self,
        outlet_id: &str,
        url: &str,
        title: &str,
        published_at: &DateTime<Utc>,
        source: ItemSource,
        hash: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO articles (outlet_id, url, title, published_at, source, hash)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(hash) DO NOTHING
            "#,
        )
        .bind(outlet_id)
        .bind(url)
        .bind(title)
        .bind(format_timestamp(published_at))
        .bind(source.as_str())
        .bind(hash)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Articles with `start <= published_at <= end`.
    #[instrument(level = "info", skip(self))]
    pub async fn articles_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ArticleRecord>> {
        let rows = sqlx::query(
            "SELECT outlet_id, published_at FROM articles WHERE published_at >= ?1 AND published_at <= ?2",
        )
        .bind(format_timestamp(&start))
        .bind(format_timestamp(&end))
        .fetch_all(&self.pool)
        .await?;

        let mut articles = Vec::with_capacity(rows.len());
        for row in rows {
            articles.push(ArticleRecord {
                outlet_id: row.try_get("outlet_id")?,
                published_at: row.try_get("published_at")?,
            });
        }
        info!(count = articles.len(), "Loaded articles in window");
        Ok(articles)
    }

    /// Replace every county row for `metric_date` with `rows`.
    ///
    /// Delete and insert share one transaction, so a failed run leaves the
    /// previous rows for that date untouched.
    #[instrument(level = "info", skip(self, rows), fields(count = rows.len()))]
    pub async fn replace_county_metrics(
        &self,
        metric_date: NaiveDate,
        rows: &[CountyMetric],
    ) -> Result<()> {
        let date = metric_date.to_string();
        let mut tx = self.pool.begin().await?;
        let deleted = sqlx::query("DELETE FROM county_metrics WHERE metric_date = ?1")
            .bind(&date)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO county_metrics
                    (county_fips, metric_date, cfi, total_articles, outlets_active, avg_posts_per_day, freshness_p50_days)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&row.county_fips)
            .bind(row.metric_date.to_string())
            .bind(row.cfi)
            .bind(row.total_articles as i64)
            .bind(row.outlets_active as i64)
            .bind(row.avg_posts_per_day)
            .bind(row.freshness_p50_days)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        info!(deleted, inserted = rows.len(), %date, "County metrics replaced");
        Ok(())
    }

    /// Stored county rows for one date, ordered by county.
    #[cfg_attr(not(test), allow(dead_code))]
    pub async fn county_metrics_for(&self, metric_date: NaiveDate) -> Result<Vec<CountyMetric>> {
        let rows = sqlx::query(
            r#"
            SELECT county_fips, cfi, total_articles, outlets_active, avg_posts_per_day, freshness_p50_days
            FROM county_metrics WHERE metric_date = ?1 ORDER BY county_fips
            "#,
        )
        .bind(metric_date.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let total: i64 = row.try_get("total_articles")?;
            let active: i64 = row.try_get("outlets_active")?;
            out.push(CountyMetric {
                county_fips: row.try_get("county_fips")?,
                metric_date,
                cfi: row.try_get("cfi")?,
                total_articles: total.max(0) as u64,
                outlets_active: active.max(0) as u64,
                avg_posts_per_day: row.try_get("avg_posts_per_day")?,
                freshness_p50_days: row.try_get("freshness_p50_days")?,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn outlet(id: &str, counties: &[&str], rss: Option<&str>) -> Outlet {
        Outlet {
            outlet_id: id.into(),
            name: format!("{id} Gazette"),
            homepage_url: format!("https://{id}.example.com"),
            rss_url: rss.map(str::to_string),
            outlet_type: "newspaper".into(),
            owner: "owner".into(),
            counties_fips: counties.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn county(fips: &str, date: NaiveDate, cfi: f64, fresh: Option<f64>) -> CountyMetric {
        CountyMetric {
            county_fips: fips.into(),
            metric_date: date,
            cfi,
            total_articles: 3,
            outlets_active: 1,
            avg_posts_per_day: cfi,
            freshness_p50_days: fresh,
        }
    }

    #[tokio::test]
    async fn test_outlets_roundtrip_keeps_order_and_counties() {
        let store = Store::in_memory().await.unwrap();
        let outlets = vec![
            outlet("zeta", &["17031", "17043"], Some("https://zeta.example.com/feed")),
            outlet("alpha", &[], None),
        ];
        store.replace_outlets(&outlets).await.unwrap();
        assert_eq!(store.outlets().await.unwrap(), outlets);

        store.replace_outlets(&outlets[1..]).await.unwrap();
        assert_eq!(store.outlets().await.unwrap(), outlets[1..].to_vec());
    }

    #[tokio::test]
    async fn test_article_dedup_by_hash() {
        let store = Store::in_memory().await.unwrap();
        let ts = Utc.with_ymd_and_hms(2025, 5, 6, 14, 30, 0).unwrap();
        let first = store
            .insert_article("a", "https://a.example.com/1", "One", &ts, ItemSource::Rss, "h1")
            .await
            .unwrap();
        let again = store
            .insert_article("a", "https://a.example.com/1", "One", &ts, ItemSource::Sitemap, "h1")
            .await
            .unwrap();
        assert!(first);
        assert!(!again);
    }

    #[tokio::test]
    async fn test_articles_in_window_bounds() {
        let store = Store::in_memory().await.unwrap();
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let stamps = [
            ("old", now - TimeDelta::days(31)),
            ("edge", now - TimeDelta::days(30)),
            ("recent", now - TimeDelta::hours(1)),
            ("skew", now + TimeDelta::hours(20)),
            ("future", now + TimeDelta::days(2)),
        ];
        for (tag, ts) in stamps {
            store
                .insert_article("a", tag, tag, &ts, ItemSource::Rss, tag)
                .await
                .unwrap();
        }

        let (start, end) = (now - TimeDelta::days(30), now + TimeDelta::days(1));
        let articles = store.articles_in_window(start, end).await.unwrap();
        let mut got: Vec<_> = articles.iter().map(|a| a.published_at.clone()).collect();
        got.sort();
        assert_eq!(
            got,
            vec![
                format_timestamp(&(now - TimeDelta::days(30))),
                format_timestamp(&(now - TimeDelta::hours(1))),
                format_timestamp(&(now + TimeDelta::hours(20))),
            ]
        );
    }

    #[tokio::test]
    async fn test_replace_county_metrics_is_idempotent_per_date() {
        let store = Store::in_memory().await.unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2025, 5, 31).unwrap();

        store
            .replace_county_metrics(yesterday, &[county("17001", yesterday, 0.2, None)])
            .await
            .unwrap();

        let rows = vec![county("17031", today, 0.5, Some(2.0)), county("17043", today, 0.1, None)];
        store.replace_county_metrics(today, &rows).await.unwrap();
        let first = store.county_metrics_for(today).await.unwrap();
        store.replace_county_metrics(today, &rows).await.unwrap();
        let second = store.county_metrics_for(today).await.unwrap();

        assert_eq!(first, rows);
        assert_eq!(first, second);

        // a rerun with fewer counties drops the stale row for that date only
        store.replace_county_metrics(today, &rows[..1]).await.unwrap();
        assert_eq!(store.county_metrics_for(today).await.unwrap(), rows[..1].to_vec());
        assert_eq!(store.county_metrics_for(yesterday).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_open_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data/news.db");
        let store = Store::open(path.to_str().unwrap()).await.unwrap();
        assert!(store.outlets().await.unwrap().is_empty());
        assert!(path.exists());
    }
}
