//! Outlet registry loading from CSV.
//!
//! The registry file has one row per outlet with the columns listed in
//! [`REQUIRED_COLUMNS`]. Every column must be present in the header; cells
//! may be empty.

use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;
use tracing::{info, instrument, warn};

use crate::error::{ConfigError, Result};
use crate::models::Outlet;
use crate::utils::parse_county_list;

pub const REQUIRED_COLUMNS: [&str; 7] = [
    "outlet_id",
    "name",
    "homepage_url",
    "rss_url",
    "outlet_type",
    "owner",
    "counties_fips",
];

#[derive(Debug, Deserialize)]
struct OutletRow {
    #[serde(default)]
    outlet_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    homepage_url: String,
    #[serde(default)]
    rss_url: String,
    #[serde(default)]
    outlet_type: String,
    #[serde(default)]
    owner: String,
    #[serde(default)]
    counties_fips: String,
}

impl From<OutletRow> for Outlet {
    fn from(row: OutletRow) -> Self {
        let rss_url = row.rss_url.trim();
        Outlet {
            outlet_id: row.outlet_id.trim().to_string(),
            name: row.name.trim().to_string(),
            homepage_url: row.homepage_url.trim().to_string(),
            rss_url: (!rss_url.is_empty()).then(|| rss_url.to_string()),
            outlet_type: row.outlet_type.trim().to_string(),
            owner: row.owner.trim().to_string(),
            counties_fips: parse_county_list(&row.counties_fips),
        }
    }
}

/// Parse an outlet registry from any CSV reader.
///
/// # Errors
///
/// [`ConfigError::MissingColumn`] when the header lacks a required column,
/// or a CSV error for malformed input. Rows with a blank `outlet_id` are
/// skipped and a repeated `outlet_id` keeps its first row.
pub fn read_outlets<R: Read>(reader: R) -> Result<Vec<Outlet>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(ConfigError::MissingColumn(column.to_string()).into());
        }
    }

    let mut seen = HashSet::new();
    let mut outlets = Vec::new();
    for (line, record) in csv_reader.deserialize::<OutletRow>().enumerate() {
        let outlet = Outlet::from(record?);
        if outlet.outlet_id.is_empty() {
            warn!(row = line + 1, "Skipping registry row without outlet_id");
            continue;
        }
        if !seen.insert(outlet.outlet_id.clone()) {
            warn!(outlet_id = %outlet.outlet_id, "Duplicate outlet_id in registry; keeping first row");
            continue;
        }
        if outlet.counties_fips.is_empty() {
            warn!(outlet_id = %outlet.outlet_id, "Outlet covers no county; excluded from county rollups");
        }
        outlets.push(outlet);
    }
    Ok(outlets)
}

/// Load the registry CSV at `path`.
#[instrument(level = "info")]
pub fn load_outlets(path: &str) -> Result<Vec<Outlet>> {
    let file = std::fs::File::open(path)?;
    let outlets = read_outlets(file)?;
    info!(count = outlets.len(), "Loaded outlet registry");
    Ok(outlets)
}
