//! Thin HTTP client shared by every harvest step.
//!
//! Fetching is best effort and retry-free: a failed or non-success response
//! is reported as `None` and the caller moves on.

use reqwest::header::CONTENT_TYPE;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::config::HarvestConfig;

/// A successfully fetched document.
#[derive(Debug, Clone)]
pub struct Page {
    pub content_type: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(config: &HarvestConfig) -> Result<Self, Box<dyn Error>> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    /// GET `url`, returning the body only for a 2xx response.
    #[instrument(level = "debug", skip(self))]
    pub async fn get(&self, url: &str) -> Option<Page> {
        let resp = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(%url, error = %e, "Fetch failed");
                return None;
            }
        };
        let status = resp.status();
        if !status.is_success() {
            debug!(%url, %status, "Non-success response");
            return None;
        }
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        match resp.text().await {
            Ok(body) => Some(Page { content_type, body }),
            Err(e) => {
                warn!(%url, error = %e, "Failed reading response body");
                None
            }
        }
    }
}
