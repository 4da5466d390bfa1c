mod raw;

use chrono::{DateTime, FixedOffset, Utc};
use feed_rs::parser;
use tracing::debug;
use url::Url;

use crate::app::{EddyError, Result};
use crate::domain::{FeedId, Item};

use raw::RawEntry;

pub const ENCLOSURE_REL: &str = "enclosure";

#[derive(Debug, Clone, PartialEq)]
pub struct EntryLink {
    pub href: String,
    pub rel: Option<String>,
    pub media_type: Option<String>,
}

impl EntryLink {
    fn is_image_enclosure(&self) -> bool {
        self.rel.as_deref() == Some(ENCLOSURE_REL)
            && self
                .media_type
                .as_deref()
                .is_some_and(|t| t.starts_with("image/"))
    }
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub links: Vec<EntryLink>,
    pub published: Option<DateTime<FixedOffset>>,
}

/// A parsed RSS/Atom document, reduced to what the cache needs.
#[derive(Debug, Clone)]
pub struct SyndicationDocument {
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub entries: Vec<Entry>,
}

#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, body: &[u8]) -> Result<SyndicationDocument> {
        let feed = parser::parse(body).map_err(|e| EddyError::FeedParse(e.to_string()))?;

        let raw_entries = raw::scan_entries(body)
            .filter(|raw| raw.len() == feed.entries.len())
            .unwrap_or_else(|| {
                debug!("Raw entries do not line up with parsed entries, using parsed values only");
                vec![RawEntry::default(); feed.entries.len()]
            });

        let image_url = feed
            .logo
            .map(|image| image.uri)
            .or_else(|| feed.icon.map(|image| image.uri));

        let entries = feed
            .entries
            .into_iter()
            .zip(raw_entries)
            .map(|(entry, raw)| {
                let mut links: Vec<EntryLink> = entry
                    .links
                    .into_iter()
                    .map(|link| EntryLink {
                        href: link.href,
                        rel: link.rel,
                        media_type: link.media_type,
                    })
                    .collect();

                links.extend(raw.enclosures.into_iter().map(|enclosure| EntryLink {
                    href: enclosure.url,
                    rel: Some(ENCLOSURE_REL.to_string()),
                    media_type: enclosure.media_type,
                }));

                let summary = entry
                    .summary
                    .map(|s| s.content)
                    .or_else(|| entry.content.and_then(|c| c.body));

                let published = entry
                    .published
                    .map(|utc| with_stated_offset(utc, raw.published))
                    .or_else(|| entry.updated.map(|utc| with_stated_offset(utc, raw.updated)));

                Entry {
                    title: entry.title.map(|t| t.content),
                    summary,
                    links,
                    published,
                }
            })
            .collect();

        Ok(SyndicationDocument {
            title: feed.title.map(|t| t.content),
            image_url,
            entries,
        })
    }

    /// Map every entry to an item. Fails as a whole if any entry lacks a link.
    pub fn to_items(
        &self,
        feed_id: FeedId,
        feed_url: &str,
        document: &SyndicationDocument,
    ) -> Result<Vec<Item>> {
        let base = Url::parse(feed_url)?;

        document
            .entries
            .iter()
            .map(|entry| {
                let first = entry.links.first().ok_or_else(|| {
                    EddyError::FeedParse(format!(
                        "entry {:?} has no link",
                        entry.title.as_deref().unwrap_or("")
                    ))
                })?;
                let url = base.join(&first.href)?;

                let image = entry
                    .links
                    .iter()
                    .find(|link| link.is_image_enclosure())
                    .map(|link| link.href.clone());

                let mut item = Item::new(
                    feed_id,
                    Item::normalize_title(entry.title.as_deref().unwrap_or("")),
                    entry.summary.clone().unwrap_or_default(),
                    url.to_string(),
                );
                item.image = image;
                item.published = entry.published;
                Ok(item)
            })
            .collect()
    }
}

/// feed-rs hands dates back in UTC; keep the offset the document wrote
/// when it names the same instant.
fn with_stated_offset(
    utc: DateTime<Utc>,
    stated: Option<DateTime<FixedOffset>>,
) -> DateTime<FixedOffset> {
    match stated {
        Some(stated) if stated == utc => stated,
        _ => utc.fixed_offset(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <link>https://example.com/</link>
    <description>A test feed</description>
    <image>
      <url>https://example.com/logo.png</url>
      <title>Test Feed</title>
      <link>https://example.com/</link>
    </image>
    <item>
      <title>Hello&#13;
World</title>
      <link>https://example.com/item1</link>
      <guid>item-1</guid>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
      <description>&lt;p&gt;Body with &lt;img src="https://example.com/inline.jpg"&gt;&lt;/p&gt;</description>
      <enclosure url="https://example.com/enclosure.jpg" length="1234" type="image/jpeg"/>
    </item>
    <item>
      <title>Test Item 2</title>
      <link>https://example.com/item2</link>
      <guid>item-2</guid>
      <description>&lt;img src="https://example.com/only-inline.png"/&gt; text</description>
    </item>
    <item>
      <title>Podcast</title>
      <link>https://example.com/item3</link>
      <guid>item-3</guid>
      <description>Audio</description>
      <enclosure url="https://example.com/episode.mp3" length="1234" type="audio/mpeg"/>
    </item>
  </channel>
</rss>"#;

    const ATOM_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Test Feed</title>
  <id>urn:example:feed</id>
  <updated>2024-01-01T00:00:00Z</updated>
  <entry>
    <title>Atom Entry 1</title>
    <link href="/posts/atom1"/>
    <link rel="enclosure" type="image/png" href="https://example.com/atom1.png"/>
    <id>atom-entry-1</id>
    <updated>2024-01-01T00:00:00Z</updated>
    <published>2024-01-01T00:00:00Z</published>
    <summary>This is Atom entry 1</summary>
  </entry>
</feed>"#;

    const NO_LINK_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Broken</title>
  <id>urn:example:broken</id>
  <updated>2024-01-01T00:00:00Z</updated>
  <entry>
    <title>Fine</title>
    <link href="https://example.com/fine"/>
    <id>fine</id>
    <updated>2024-01-01T00:00:00Z</updated>
  </entry>
  <entry>
    <title>Linkless</title>
    <id>linkless</id>
    <updated>2024-01-01T00:00:00Z</updated>
  </entry>
</feed>"#;

    const OFFSET_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Offsets</title>
    <link>https://example.com/</link>
    <description>d</description>
    <item>
      <title>Local time</title>
      <link>https://example.com/local</link>
      <pubDate>Tue, 05 Mar 2024 14:30:00 +0100</pubDate>
      <description>&lt;img src="https://example.com/body.jpg"&gt;</description>
      <media:content url="https://example.com/m.jpg" type="image/jpeg" medium="image"/>
    </item>
  </channel>
</rss>"#;

    fn items(body: &str, url: &str) -> Vec<Item> {
        let normalizer = Normalizer::new();
        let document = normalizer.parse(body.as_bytes()).unwrap();
        normalizer.to_items(FeedId(1), url, &document).unwrap()
    }

    #[test]
    fn test_parse_rss_document() {
        let document = Normalizer::new().parse(RSS_SAMPLE.as_bytes()).unwrap();
        assert_eq!(document.title, Some("Test Feed".into()));
        assert_eq!(document.image_url, Some("https://example.com/logo.png".into()));
        assert_eq!(document.entries.len(), 3);
    }

    #[test]
    fn test_title_line_breaks_collapsed() {
        let items = items(RSS_SAMPLE, "https://example.com/feed.xml");
        assert_eq!(items[0].title, "Hello World");
    }

    #[test]
    fn test_enclosure_image_wins_over_body_image() {
        let items = items(RSS_SAMPLE, "https://example.com/feed.xml");
        assert_eq!(
            items[0].image,
            Some("https://example.com/enclosure.jpg".into())
        );
    }

    #[test]
    fn test_no_enclosure_leaves_image_empty() {
        let items = items(RSS_SAMPLE, "https://example.com/feed.xml");
        assert_eq!(items[1].image, None);
        assert!(items[1].summary.contains("<img"));
    }

    #[test]
    fn test_non_image_enclosure_ignored() {
        let items = items(RSS_SAMPLE, "https://example.com/feed.xml");
        assert_eq!(items[2].image, None);
    }

    #[test]
    fn test_summary_kept_verbatim() {
        let items = items(RSS_SAMPLE, "https://example.com/feed.xml");
        assert_eq!(
            items[0].summary,
            r#"<p>Body with <img src="https://example.com/inline.jpg"></p>"#
        );
    }

    #[test]
    fn test_items_keep_source_order_and_owner() {
        let items = items(RSS_SAMPLE, "https://example.com/feed.xml");
        let urls: Vec<_> = items.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/item1",
                "https://example.com/item2",
                "https://example.com/item3"
            ]
        );
        assert!(items.iter().all(|i| i.feed_id == FeedId(1)));
        assert!(items[0].published.is_some());
    }

    #[test]
    fn test_atom_enclosure_link_and_relative_url() {
        let items = items(ATOM_SAMPLE, "https://example.com/feed.atom");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Atom Entry 1");
        assert_eq!(items[0].url, "https://example.com/posts/atom1");
        assert_eq!(items[0].image, Some("https://example.com/atom1.png".into()));
        assert_eq!(items[0].summary, "This is Atom entry 1");
    }

    #[test]
    fn test_entry_without_link_fails_whole_document() {
        let normalizer = Normalizer::new();
        let document = normalizer.parse(NO_LINK_SAMPLE.as_bytes()).unwrap();
        let result = normalizer.to_items(FeedId(1), "https://example.com/feed", &document);
        assert!(matches!(result, Err(EddyError::FeedParse(_))));
    }

    #[test]
    fn test_publish_offset_as_written() {
        let items = items(OFFSET_SAMPLE, "https://example.com/feed.xml");
        let published = items[0].published.unwrap();
        assert_eq!(published.offset().local_minus_utc(), 3600);
        assert_eq!(published.to_rfc3339(), "2024-03-05T14:30:00+01:00");
    }

    #[test]
    fn test_atom_publish_offset_as_written() {
        let body = ATOM_SAMPLE.replace(
            "<published>2024-01-01T00:00:00Z</published>",
            "<published>2024-01-01T09:00:00+09:00</published>",
        );
        let items = items(&body, "https://example.com/feed.atom");
        assert_eq!(
            items[0].published.unwrap().to_rfc3339(),
            "2024-01-01T09:00:00+09:00"
        );
    }

    #[test]
    fn test_media_content_is_not_an_enclosure() {
        let items = items(OFFSET_SAMPLE, "https://example.com/feed.xml");
        assert_eq!(items[0].image, None);
    }

    #[test]
    fn test_malformed_document() {
        let result = Normalizer::new().parse(b"<html><body>nope</body></html>");
        assert!(matches!(result, Err(EddyError::FeedParse(_))));
    }
}
