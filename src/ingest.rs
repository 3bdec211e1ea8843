// Feed entry normalization: already-fetched feed entries to Documents.
//
// Fetching feeds and resolving canonical URLs happen elsewhere; this module
// only turns an entry (as exported to JSON) into the Document that gets
// stored. `newscluster import` reads a JSON array of entries.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::models::Document;
use crate::text::html::{first_image_src, strip_html};

/// One entry of a syndication feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedEntry {
    pub id: Option<String>,
    pub title: Option<String>,
    /// Summary HTML
    pub summary: Option<String>,
    pub link: Option<String>,
    pub links: Vec<FeedLink>,
    pub published: Option<String>,
    pub updated: Option<String>,
    pub created: Option<String>,
}

/// An alternate link of an entry (enclosures, images, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedLink {
    pub href: String,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
}

/// Drop the `#fragment`, then the `?query`, of a link.
pub fn clean_link(url: &str) -> String {
    let without_fragment = url.split('#').next().unwrap_or(url);
    without_fragment
        .split('?')
        .next()
        .unwrap_or(without_fragment)
        .to_string()
}

/// Parse an RFC 3339 or RFC 2822 timestamp.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Normalize a feed entry into a Document.
///
/// Returns `None` for entries without a title, or without both an id and a
/// link. Unparseable dates fall through to the next candidate and finally
/// to `now`.
pub fn parse_entry(entry: &FeedEntry, now: DateTime<Utc>) -> Option<Document> {
    let title = entry.title.as_deref()?.trim();
    if title.is_empty() {
        return None;
    }

    let summary = entry.summary.as_deref().unwrap_or(title);
    let description = strip_html(summary).trim().to_string();

    let raw_guid = entry.id.as_deref().or(entry.link.as_deref())?;
    let link = entry.link.as_deref().map(clean_link);
    let guid = match (&link, entry.link.as_deref()) {
        (Some(cleaned), Some(raw)) if raw == raw_guid => cleaned.clone(),
        _ => raw_guid.to_string(),
    };

    let published_at = [&entry.published, &entry.created, &entry.updated]
        .into_iter()
        .flatten()
        .find_map(|value| parse_timestamp(value))
        .unwrap_or(now);

    let media = entry
        .links
        .iter()
        .rev()
        .find(|l| {
            l.media_type
                .as_deref()
                .is_some_and(|t| t.starts_with("image/"))
        })
        .map(|l| l.href.clone())
        .or_else(|| first_image_src(summary));

    Some(Document {
        guid,
        title: title.to_string(),
        description,
        link,
        media,
        published_at,
        source_id: None,
    })
}

/// Read a JSON array of feed entries and normalize them.
///
/// Entries that cannot be turned into a Document are skipped; the second
/// value is how many were.
pub fn load_entries(path: &Path, now: DateTime<Utc>) -> Result<(Vec<Document>, usize)> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let entries: Vec<FeedEntry> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of feed entries", path.display()))?;

    let total = entries.len();
    let documents: Vec<Document> = entries
        .iter()
        .filter_map(|entry| parse_entry(entry, now))
        .collect();
    let skipped = total - documents.len();
    debug!(total, skipped, "Feed entries parsed");
    Ok((documents, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    fn entry() -> FeedEntry {
        FeedEntry {
            id: Some("urn:article:1".to_string()),
            title: Some("Grève à la SNCF".to_string()),
            summary: Some("<p>Le trafic est <b>perturbé</b></p>".to_string()),
            link: Some("https://news.example/article?utm_source=rss#top".to_string()),
            ..FeedEntry::default()
        }
    }

    #[test]
    fn test_clean_link() {
        assert_eq!(
            clean_link("https://a.example/x?utm=1#frag"),
            "https://a.example/x"
        );
        assert_eq!(clean_link("https://a.example/x#f?q"), "https://a.example/x");
        assert_eq!(clean_link("https://a.example/x"), "https://a.example/x");
    }

    #[test]
    fn test_parse_entry_basic_fields() {
        let doc = parse_entry(&entry(), now()).unwrap();
        assert_eq!(doc.guid, "urn:article:1");
        assert_eq!(doc.title, "Grève à la SNCF");
        assert_eq!(doc.description, "Le trafic est perturbé");
        assert_eq!(doc.link.as_deref(), Some("https://news.example/article"));
        assert_eq!(doc.published_at, now());
        assert!(doc.media.is_none());
    }

    #[test]
    fn test_link_as_guid_is_cleaned() {
        let mut e = entry();
        e.id = None;
        let doc = parse_entry(&e, now()).unwrap();
        assert_eq!(doc.guid, "https://news.example/article");

        e.id = e.link.clone();
        assert_eq!(parse_entry(&e, now()).unwrap().guid, "https://news.example/article");
    }

    #[test]
    fn test_entries_without_title_or_identity_are_rejected() {
        let mut e = entry();
        e.title = None;
        assert!(parse_entry(&e, now()).is_none());

        let mut e = entry();
        e.id = None;
        e.link = None;
        assert!(parse_entry(&e, now()).is_none());
    }

    #[test]
    fn test_missing_summary_falls_back_to_title() {
        let mut e = entry();
        e.summary = None;
        assert_eq!(parse_entry(&e, now()).unwrap().description, "Grève à la SNCF");
    }

    #[test]
    fn test_published_preferred_over_created_and_updated() {
        let mut e = entry();
        e.updated = Some("2024-05-03T10:00:00Z".to_string());
        e.created = Some("Thu, 02 May 2024 10:00:00 +0000".to_string());
        assert_eq!(
            parse_entry(&e, now()).unwrap().published_at,
            Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap()
        );

        e.published = Some("2024-05-01T10:00:00+02:00".to_string());
        assert_eq!(
            parse_entry(&e, now()).unwrap().published_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
        );

        e.published = Some("not a date".to_string());
        assert_eq!(
            parse_entry(&e, now()).unwrap().published_at,
            Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_media_prefers_last_image_link_then_embedded_img() {
        let mut e = entry();
        e.summary = Some(r#"<img src="https://img.example/inline.jpg"> text"#.to_string());
        assert_eq!(
            parse_entry(&e, now()).unwrap().media.as_deref(),
            Some("https://img.example/inline.jpg")
        );

        e.links = vec![
            FeedLink {
                href: "https://img.example/a.png".to_string(),
                media_type: Some("image/png".to_string()),
            },
            FeedLink {
                href: "https://news.example/article".to_string(),
                media_type: Some("text/html".to_string()),
            },
            FeedLink {
                href: "https://img.example/b.jpg".to_string(),
                media_type: Some("image/jpeg".to_string()),
            },
        ];
        assert_eq!(
            parse_entry(&e, now()).unwrap().media.as_deref(),
            Some("https://img.example/b.jpg")
        );
    }

    #[test]
    fn test_entries_deserialize_from_json() {
        let json = r#"[{"title": "A", "link": "https://x.example/a",
                        "links": [{"href": "https://x.example/a.jpg", "type": "image/jpeg"}]}]"#;
        let entries: Vec<FeedEntry> = serde_json::from_str(json).unwrap();
        let doc = parse_entry(&entries[0], now()).unwrap();
        assert_eq!(doc.media.as_deref(), Some("https://x.example/a.jpg"));
        assert_eq!(doc.guid, "https://x.example/a");
    }
}
