//! JSON snapshot output for dashboards and other API consumers.
//!
//! # Output Structure
//!
//! Files are organized by metric date:
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     └── metrics.json
//! ```
//!
//! Re-running on the same date overwrites that date's snapshot, matching the
//! replace-by-date semantics of the county metrics table.

use crate::error::Result;
use crate::models::MetricsSnapshot;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write a [`MetricsSnapshot`] to a JSON file with date-based directory structure.
///
/// # Arguments
///
/// * `snapshot` - The computed outlet and county metrics
/// * `json_output_dir` - Base directory for JSON output
///
/// # Returns
///
/// The path written, or an error if directory creation or file writing fails.
///
/// # Output Path
///
/// The file is written to: `{json_output_dir}/{metric_date}/metrics.json`
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_snapshot(snapshot: &MetricsSnapshot, json_output_dir: &str) -> Result<String> {
    let json = serde_json::to_string_pretty(snapshot)?;

    let full_json_dir = format!(
        "{}/{}",
        json_output_dir.trim_end_matches('/'),
        snapshot.metric_date
    );

    info!(%full_json_dir, "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&full_json_dir).await {
        error!(%full_json_dir, error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let output_json_filename = format!("{}/metrics.json", full_json_dir);
    fs::write(&output_json_filename, json).await?;
    info!(path = %output_json_filename, "Wrote JSON metrics snapshot");

    Ok(output_json_filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CountyMetric, OutletMetric};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn snapshot() -> MetricsSnapshot {
        let metric_date = NaiveDate::from_ymd_opt(2025, 5, 6).unwrap();
        MetricsSnapshot {
            generated_at: Utc.with_ymd_and_hms(2025, 5, 6, 8, 0, 0).unwrap(),
            metric_date,
            window_days: 365,
            outlets: vec![OutletMetric::empty("a")],
            counties: vec![CountyMetric {
                county_fips: "17031".into(),
                metric_date,
                cfi: 0.0,
                total_articles: 0,
                outlets_active: 1,
                avg_posts_per_day: 0.0,
                freshness_p50_days: None,
            }],
        }
    }

    #[tokio::test]
    async fn test_write_snapshot_dated_path() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().to_str().unwrap();
        let path = write_snapshot(&snapshot(), base).await.unwrap();

        assert!(path.ends_with("2025-05-06/metrics.json"));
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["window_days"], 365);
        assert_eq!(value["generated_at"], "2025-05-06T08:00:00Z");
        assert!(value["outlets"][0]["freshness_days"].is_null());
        assert!(value["counties"][0]["freshness_p50_days"].is_null());
    }

    #[tokio::test]
    async fn test_write_snapshot_overwrites_same_date() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().to_str().unwrap();
        let mut snap = snapshot();
        write_snapshot(&snap, base).await.unwrap();
        snap.window_days = 30;
        let path = write_snapshot(&snap, base).await.unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["window_days"], 30);
    }
}
