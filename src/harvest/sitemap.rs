//! XML sitemap fallback for outlets whose feed yields nothing.

use futures::stream::{self, StreamExt};
use quick_xml::de::{from_str, DeError};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::discover::canonicalize_url;
use super::http::Fetcher;
use crate::models::FeedItem;
use crate::utils::parse_timestamp;

#[derive(Debug, Deserialize)]
struct UrlSet {
    #[serde(rename = "url", default)]
    urls: Vec<UrlEntry>,
}

#[derive(Debug, Deserialize)]
struct UrlEntry {
    loc: Option<String>,
    lastmod: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SitemapIndex {
    #[serde(rename = "sitemap", default)]
    sitemaps: Vec<IndexEntry>,
}

#[derive(Debug, Deserialize)]
struct IndexEntry {
    loc: Option<String>,
}

/// A parsed sitemap document.
#[derive(Debug, Clone, PartialEq)]
pub enum Sitemap {
    /// A `<urlset>` of pages; `lastmod` becomes the publish time.
    Pages(Vec<FeedItem>),
    /// A `<sitemapindex>` pointing at child sitemaps.
    Index(Vec<String>),
}

pub fn parse_sitemap(xml: &str) -> Result<Sitemap, DeError> {
    if xml.contains("<sitemapindex") {
        let index: SitemapIndex = from_str(xml)?;
        return Ok(Sitemap::Index(
            index
                .sitemaps
                .into_iter()
                .filter_map(|s| s.loc.map(|l| l.trim().to_string()))
                .filter(|l| !l.is_empty())
                .collect(),
        ));
    }
    let set: UrlSet = from_str(xml)?;
    Ok(Sitemap::Pages(
        set.urls
            .into_iter()
            .filter_map(|u| {
                let link = u.loc?.trim().to_string();
                Some(FeedItem {
                    title: String::new(),
                    link,
                    published: u.lastmod.as_deref().and_then(parse_timestamp),
                })
            })
            .collect(),
    ))
}

async fn fetch_sitemap(fetcher: &Fetcher, url: &str) -> Option<Sitemap> {
    let page = fetcher.get(url).await?;
    match parse_sitemap(&page.body) {
        Ok(sitemap) => Some(sitemap),
        Err(e) => {
            warn!(%url, error = %e, "Sitemap did not parse");
            None
        }
    }
}

/// Collect up to `max_items` pages from `/sitemap.xml` under the homepage,
/// following at most `max_children` child sitemaps of an index.
#[instrument(level = "info", skip(fetcher))]
pub async fn harvest_sitemap(
    fetcher: &Fetcher,
    homepage_url: &str,
    max_items: usize,
    max_children: usize,
) -> Vec<FeedItem> {
    let Some(root_url) = canonicalize_url(homepage_url, "/sitemap.xml") else {
        return Vec::new();
    };

    let items: Vec<FeedItem> = match fetch_sitemap(fetcher, &root_url).await {
        None => Vec::new(),
        Some(Sitemap::Pages(pages)) => pages.into_iter().take(max_items).collect(),
        Some(Sitemap::Index(children)) => {
            debug!(children = children.len(), "Following sitemap index");
            stream::iter(children.into_iter().take(max_children))
                .then(|child| async move {
                    match fetch_sitemap(fetcher, &child).await {
                        Some(Sitemap::Pages(pages)) => pages,
                        _ => Vec::new(),
                    }
                })
                .flat_map(stream::iter)
                .take(max_items)
                .collect()
                .await
        }
    };

    info!(count = items.len(), "Collected sitemap entries");
    items
}
