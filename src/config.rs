//! Run configuration: the trailing window and the optional YAML settings file.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, instrument};

use crate::error::{CadenceError, ConfigError};

/// Upper bound for the window, about a century. Keeps date arithmetic in range.
const MAX_WINDOW_DAYS: i64 = 36_500;

/// A validated, strictly positive trailing window in days.
///
/// The same value is the denominator of `avg_posts_per_day` and the width of
/// the article query predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowDays(u32);

impl WindowDays {
    pub fn new(days: i64) -> Result<Self, ConfigError> {
        if days <= 0 {
            return Err(ConfigError::NonPositiveWindow(days));
        }
        if days > MAX_WINDOW_DAYS {
            return Err(ConfigError::WindowTooLarge(days));
        }
        Ok(Self(days as u32))
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// Inclusive query bounds `[now - days, now + 1 day]`.
    ///
    /// The extra day absorbs clock skew between outlets and this host.
    pub fn bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (now - TimeDelta::days(self.0 as i64), now + TimeDelta::days(1))
    }
}

/// Settings for the harvester, loaded from an optional YAML file.
///
/// ```yaml
/// user_agent: "News-Cadence/0.1"
/// request_timeout_secs: 12
/// feed_candidates: ["/feed", "/rss.xml"]
/// max_child_sitemaps: 25
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub feed_candidates: Vec<String>,
    pub max_child_sitemaps: usize,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("News-Cadence/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: 12,
            feed_candidates: ["/feed", "/rss", "/rss.xml", "/feed.xml", "/index.xml"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_child_sitemaps: 25,
        }
    }
}

/// Top-level config file layout.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub harvest: HarvestConfig,
}

impl AppConfig {
    pub fn from_yaml(path: &str, contents: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(contents).map_err(|source| ConfigError::InvalidConfigFile {
            path: path.to_string(),
            source,
        })
    }

    /// Load the config file, or defaults when no path is given.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> Result<Self, CadenceError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !Path::new(path).exists() {
            info!(path, "Config file not found; using defaults");
            return Ok(Self::default());
        }
        let contents = tokio::fs::read_to_string(path).await?;
        let config = Self::from_yaml(path, &contents)?;
        info!(path, "Loaded configuration");
        Ok(config)
    }
}
