//! Flat CSV exports of outlet and county metrics.
//!
//! Undefined values (`None`) are written as empty cells, never as `0` or `NaN`.

use serde::Serialize;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

use crate::error::Result;
use crate::models::{CountyMetric, OutletMetric};

pub const OUTLET_METRICS_FILE: &str = "outlet_metrics.csv";
pub const COUNTY_METRICS_FILE: &str = "county_metrics.csv";

/// Serialize rows to CSV bytes with a header line.
///
/// An empty slice still produces the header so consumers can tell "no rows"
/// from "no file".
fn to_csv<T: Serialize>(rows: &[T], header: &[&str]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()).into())
}

const OUTLET_HEADER: [&str; 6] = [
    "outlet_id",
    "total_articles",
    "days_active",
    "avg_posts_per_day",
    "median_gap_days",
    "freshness_days",
];

const COUNTY_HEADER: [&str; 7] = [
    "county_fips",
    "metric_date",
    "cfi",
    "total_articles",
    "outlets_active",
    "avg_posts_per_day",
    "freshness_p50_days",
];

/// Write `outlet_metrics.csv` into `output_dir`.
#[instrument(level = "info", skip_all, fields(%output_dir, rows = rows.len()))]
pub async fn write_outlet_metrics(output_dir: &str, rows: &[OutletMetric]) -> Result<String> {
    let path = Path::new(output_dir).join(OUTLET_METRICS_FILE);
    fs::write(&path, to_csv(rows, &OUTLET_HEADER)?).await?;
    let path = path.display().to_string();
    info!(path = %path, "Wrote outlet metrics");
    Ok(path)
}

/// Write `county_metrics.csv` into `output_dir`.
#[instrument(level = "info", skip_all, fields(%output_dir, rows = rows.len()))]
pub async fn write_county_metrics(output_dir: &str, rows: &[CountyMetric]) -> Result<String> {
    let path = Path::new(output_dir).join(COUNTY_METRICS_FILE);
    fs::write(&path, to_csv(rows, &COUNTY_HEADER)?).await?;
    let path = path.display().to_string();
    info!(path = %path, "Wrote county metrics");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_outlet_csv_leaves_undefined_cells_empty() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().to_str().unwrap();
        let rows = vec![
            OutletMetric {
                outlet_id: "a".into(),
                total_articles: 3,
                days_active: 2,
                avg_posts_per_day: 0.5,
                median_gap_days: Some(1.25),
                freshness_days: Some(0.75),
            },
            OutletMetric::empty("b"),
        ];
        let path = write_outlet_metrics(out, &rows).await.unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "outlet_id,total_articles,days_active,avg_posts_per_day,median_gap_days,freshness_days");
        assert_eq!(lines[1], "a,3,2,0.5,1.25,0.75");
        assert_eq!(lines[2], "b,0,0,0.0,,");
    }

    #[tokio::test]
    async fn test_county_csv_rows() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().to_str().unwrap();
        let rows = vec![CountyMetric {
            county_fips: "17031".into(),
            metric_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            cfi: 0.25,
            total_articles: 10,
            outlets_active: 2,
            avg_posts_per_day: 0.5,
            freshness_p50_days: None,
        }];
        let path = write_county_metrics(out, &rows).await.unwrap();
        let text = std::fs::read_to_string(path).unwrap();

        assert_eq!(
            text,
            "county_fips,metric_date,cfi,total_articles,outlets_active,avg_posts_per_day,freshness_p50_days\n\
             17031,2025-06-01,0.25,10,2,0.5,\n"
        );
    }

    #[tokio::test]
    async fn test_empty_county_csv_has_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().to_str().unwrap();
        let path = write_county_metrics(out, &[]).await.unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
