//! Utility functions for timestamps, county lists, hashing and the file system.
//!
//! This module provides helper functions used throughout the application:
//! - Timestamp normalization to UTC and the store's text format
//! - Median over defined values
//! - County list parsing for the outlet registry
//! - Content hashing of canonical article URLs
//! - File system validation for output directories

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeDelta, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

use crate::models::CountyFips;

const SECONDS_PER_DAY: f64 = 86_400.0;

static COUNTY_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[|;,]").unwrap());

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp in any of the accepted formats and normalize it to UTC.
///
/// Accepts RFC 3339, RFC 2822, naive `YYYY-MM-DD HH:MM:SS[.f]` (assumed UTC)
/// and bare `YYYY-MM-DD` dates (midnight UTC).
///
/// # Returns
///
/// `None` when the input matches none of the formats. Callers treat that
/// as a data quality problem and drop the record.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Render a timestamp in the store's canonical form, e.g. `2025-05-06T14:30:00Z`.
///
/// Fixed width and second precision, so lexicographic order matches time order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// A duration expressed in fractional days.
pub fn delta_days(delta: TimeDelta) -> f64 {
    delta.num_milliseconds() as f64 / 1_000.0 / SECONDS_PER_DAY
}

/// Median of a set of values. Even-sized inputs average the two middle values.
///
/// Returns `None` for an empty input.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Split a delimiter-joined county list into identifiers.
///
/// Pieces are trimmed, empty pieces dropped, and duplicates removed keeping
/// the first occurrence. An unparseable list yields an empty vector.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(parse_county_list("17031| 17043"), vec!["17031", "17043"]);
/// assert!(parse_county_list(" | ").is_empty());
/// ```
pub fn parse_county_list(raw: &str) -> Vec<CountyFips> {
    let mut out: Vec<CountyFips> = Vec::new();
    for piece in COUNTY_SEPARATOR.split(raw) {
        let fips = piece.trim();
        if fips.is_empty() || out.iter().any(|f| f == fips) {
            continue;
        }
        out.push(fips.to_string());
    }
    out
}

/// Join a county list back into the registry's `|`-separated form.
pub fn join_county_list(counties: &[CountyFips]) -> String {
    counties.join("|")
}

/// Hex-encoded SHA-256 of a canonical article URL, used as the dedup key.
pub fn url_hash(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` bytes (rounded down to a char
/// boundary) with an ellipsis and byte count indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file. Called
/// before any computation so an unwritable output fails the run early.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
