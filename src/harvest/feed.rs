//! RSS 2.0 and Atom feed parsing.

use quick_xml::de::{from_str, DeError};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use serde::Deserialize;

use crate::models::FeedItem;
use crate::utils::parse_timestamp;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

impl AtomEntry {
    fn best_link(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
            .or_else(|| self.links.first())
            .and_then(|l| l.href.as_deref())
    }
}

/// Replace HTML-only entities that are not valid in XML.
fn scrub_html_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}

/// Local name of the document's root element, if it has one.
fn root_element(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

fn rss_items(xml: &str) -> Result<Vec<FeedItem>, DeError> {
    let rss: Rss = from_str(xml)?;
    Ok(rss
        .channel
        .items
        .into_iter()
        .map(|it| FeedItem {
            title: it.title.unwrap_or_default().trim().to_string(),
            link: it.link.unwrap_or_default().trim().to_string(),
            published: it.pub_date.as_deref().and_then(parse_timestamp),
        })
        .collect())
}

fn atom_items(xml: &str) -> Result<Vec<FeedItem>, DeError> {
    let atom: AtomFeed = from_str(xml)?;
    Ok(atom
        .entries
        .into_iter()
        .map(|entry| FeedItem {
            title: entry
                .title
                .as_ref()
                .map(|t| t.value.trim().to_string())
                .unwrap_or_default(),
            link: entry.best_link().unwrap_or_default().trim().to_string(),
            published: [entry.published.as_deref(), entry.updated.as_deref()]
                .into_iter()
                .flatten()
                .find_map(parse_timestamp),
        })
        .collect())
}

/// Parse an RSS 2.0 or Atom document into feed items, keeping at most `max_items`.
///
/// The root element picks the format: `<feed>` is Atom, anything else is
/// read as RSS, so the returned error always belongs to the format tried.
/// Items without a link are kept here and dropped later when they cannot be
/// canonicalized. A missing or unparseable date yields `published: None`.
pub fn parse_feed(xml: &str, max_items: usize) -> Result<Vec<FeedItem>, DeError> {
    let xml = scrub_html_entities(xml);

    let items = match root_element(&xml).as_deref() {
        Some("feed") => atom_items(&xml)?,
        _ => rss_items(&xml)?,
    };

    Ok(items.into_iter().take(max_items).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <title>Galena Gazette</title>
    <link>https://galenagazette.com</link>
    <description>Local news&nbsp;for Jo Daviess County</description>
    <item>
      <title><![CDATA[Council approves budget]]></title>
      <link>https://galenagazette.com/2025/05/06/budget</link>
      <pubDate>Tue, 06 May 2025 14:30:00 +0000</pubDate>
    </item>
    <item>
      <title>Fair opens</title>
      <link>https://galenagazette.com/2025/05/05/fair</link>
      <pubDate>sometime last week</pubDate>
    </item>
    <item>
      <title>Undated</title>
      <link>https://galenagazette.com/undated</link>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Capitol News</title>
  <entry>
    <title type="html">Session wraps up</title>
    <link rel="edit" href="https://capitolnews.example/edit/1"/>
    <link rel="alternate" href="https://capitolnews.example/session"/>
    <updated>2025-05-07T10:00:00Z</updated>
    <published>2025-05-06T09:00:00-05:00</published>
  </entry>
  <entry>
    <title>Only updated</title>
    <link href="https://capitolnews.example/updated"/>
    <updated>2025-05-08T00:00:00Z</updated>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss() {
        let items = parse_feed(RSS, 100).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "Council approves budget");
        assert_eq!(items[0].link, "https://galenagazette.com/2025/05/06/budget");
        assert_eq!(items[0].published, Some(Utc.with_ymd_and_hms(2025, 5, 6, 14, 30, 0).unwrap()));
        assert_eq!(items[1].published, None);
        assert_eq!(items[2].published, None);
    }

    #[test]
    fn test_parse_rss_caps_items() {
        assert_eq!(parse_feed(RSS, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_atom() {
        let items = parse_feed(ATOM, 100).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Session wraps up");
        assert_eq!(items[0].link, "https://capitolnews.example/session");
        assert_eq!(items[0].published, Some(Utc.with_ymd_and_hms(2025, 5, 6, 14, 0, 0).unwrap()));
        assert_eq!(items[1].link, "https://capitolnews.example/updated");
        assert_eq!(items[1].published, Some(Utc.with_ymd_and_hms(2025, 5, 8, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_parse_atom_with_links_split_by_other_elements() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>County Ledger</title>
  <entry>
    <link rel="alternate" type="text/html" href="https://ledger.example/2025/05/levy"/>
    <title>Levy vote delayed</title>
    <published>2025-05-09T08:15:00Z</published>
    <link rel="replies" type="application/atom+xml" href="https://ledger.example/2025/05/levy/comments"/>
  </entry>
</feed>"#;
        let items = parse_feed(xml, 10).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Levy vote delayed");
        assert_eq!(items[0].link, "https://ledger.example/2025/05/levy");
        assert_eq!(items[0].published, Some(Utc.with_ymd_and_hms(2025, 5, 9, 8, 15, 0).unwrap()));
    }

    #[test]
    fn test_broken_atom_reports_atom_error() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry><title>Unclosed</entry></feed>"#;
        let err = parse_feed(xml, 10).unwrap_err().to_string();
        assert!(!err.contains("channel"), "unexpected error: {err}");
    }

    #[test]
    fn test_root_element() {
        assert_eq!(root_element(RSS).as_deref(), Some("rss"));
        assert_eq!(root_element(ATOM).as_deref(), Some("feed"));
        assert_eq!(root_element("   ").as_deref(), None);
    }

    #[test]
    fn test_html_page_yields_no_items() {
        let html = "<html><head><title>Home</title></head><body><p>Welcome</p></body></html>";
        assert!(parse_feed(html, 10).unwrap_or_default().is_empty());
    }
}
