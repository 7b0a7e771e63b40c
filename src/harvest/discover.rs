//! Feed discovery for outlets without a registered feed URL.
//!
//! Two passes, first hit wins:
//! 1. Probe well-known feed paths under the homepage
//! 2. Read `<link rel="alternate" type="application/rss+xml">` tags from the homepage

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

use super::http::Fetcher;

static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("link[href]").unwrap());

/// Resolve `link` against `base`; falls back to `link` itself when it is
/// already absolute. Returns `None` for empty or unresolvable links.
pub fn canonicalize_url(base: &str, link: &str) -> Option<String> {
    let link = link.trim();
    if link.is_empty() {
        return None;
    }
    if let Ok(base) = Url::parse(base) {
        if let Ok(resolved) = base.join(link) {
            return Some(resolved.to_string());
        }
    }
    Url::parse(link).ok().map(|u| u.to_string())
}

/// Does a response look like an XML feed?
pub fn looks_like_xml(content_type: &str, body: &str) -> bool {
    content_type.to_ascii_lowercase().contains("xml") || body.trim_start().starts_with("<?xml")
}

/// Find an RSS/Atom alternate link in a homepage's HTML.
pub fn feed_link_from_html(homepage_url: &str, html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    for element in document.select(&LINK_SELECTOR) {
        let attrs = element.value();
        let is_alternate = attrs
            .attr("rel")
            .map(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("alternate")))
            .unwrap_or(false);
        let kind = attrs.attr("type").unwrap_or_default().to_ascii_lowercase();
        if !is_alternate || !(kind.contains("rss") || kind.contains("atom")) {
            continue;
        }
        if let Some(href) = attrs.attr("href") {
            if let Some(url) = canonicalize_url(homepage_url, href) {
                return Some(url);
            }
        }
    }
    None
}

/// Discover a feed URL for `homepage_url`.
#[instrument(level = "info", skip(fetcher, candidates))]
pub async fn discover_feed(
    fetcher: &Fetcher,
    homepage_url: &str,
    candidates: &[String],
) -> Option<String> {
    for candidate in candidates {
        let Some(url) = canonicalize_url(homepage_url, candidate) else {
            continue;
        };
        if let Some(page) = fetcher.get(&url).await {
            if looks_like_xml(&page.content_type, &page.body) {
                info!(%url, "Discovered feed at well-known path");
                return Some(url);
            }
        }
    }

    let page = fetcher.get(homepage_url).await?;
    let found = feed_link_from_html(homepage_url, &page.body);
    match &found {
        Some(url) => info!(%url, "Discovered feed from homepage link tag"),
        None => debug!("No feed found"),
    }
    found
}
