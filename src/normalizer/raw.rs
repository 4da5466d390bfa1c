//! A second look at the document for what feed-rs normalizes away: the
//! offset a publish date was written with, and whether an entry's media came
//! from an RSS `<enclosure>` or from Media RSS.

use chrono::{DateTime, FixedOffset};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

#[derive(Debug, Clone, PartialEq)]
pub struct RawEnclosure {
    pub url: String,
    pub media_type: Option<String>,
}

/// Per-entry details, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    pub published: Option<DateTime<FixedOffset>>,
    pub updated: Option<DateTime<FixedOffset>>,
    pub enclosures: Vec<RawEnclosure>,
}

#[derive(Clone, Copy)]
enum DateField {
    Published,
    Updated,
}

/// Returns `None` if the document is not well-formed XML.
pub fn scan_entries(body: &[u8]) -> Option<Vec<RawEntry>> {
    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);

    let mut entries: Vec<RawEntry> = Vec::new();
    let mut depth = 0usize;
    let mut entry_depth: Option<usize> = None;
    let mut field: Option<DateField> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                match entry_depth {
                    None if is_entry(&e) => {
                        entry_depth = Some(depth);
                        entries.push(RawEntry::default());
                    }
                    Some(d) if depth == d + 1 => {
                        field = date_field(&e);
                        if is_enclosure(&e) {
                            push_enclosure(&e, entries.last_mut());
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                if entry_depth == Some(depth) && is_enclosure(&e) {
                    push_enclosure(&e, entries.last_mut());
                }
            }
            Ok(Event::Text(text)) => {
                if let (Some(field), Some(entry)) = (field.take(), entries.last_mut()) {
                    let value = text.unescape().ok().and_then(|t| parse_date(&t));
                    match field {
                        DateField::Published if entry.published.is_none() => {
                            entry.published = value
                        }
                        DateField::Updated if entry.updated.is_none() => entry.updated = value,
                        _ => {}
                    }
                }
            }
            Ok(Event::End(_)) => {
                if entry_depth == Some(depth) {
                    entry_depth = None;
                }
                field = None;
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!("Raw entry scan stopped: {}", e);
                return None;
            }
            _ => {}
        }
    }

    Some(entries)
}

fn is_entry(element: &BytesStart) -> bool {
    matches!(element.local_name().as_ref(), b"item" | b"entry")
}

fn is_enclosure(element: &BytesStart) -> bool {
    element.name().as_ref() == b"enclosure"
}

fn date_field(element: &BytesStart) -> Option<DateField> {
    match element.local_name().as_ref() {
        b"pubDate" | b"published" | b"date" => Some(DateField::Published),
        b"updated" => Some(DateField::Updated),
        _ => None,
    }
}

fn push_enclosure(element: &BytesStart, entry: Option<&mut RawEntry>) {
    let Some(entry) = entry else { return };
    let Some(url) = attribute(element, "url") else { return };
    entry.enclosures.push(RawEnclosure {
        url,
        media_type: attribute(element, "type"),
    });
}

fn attribute(element: &BytesStart, name: &str) -> Option<String> {
    element
        .try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_date(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    DateTime::parse_from_rfc2822(text)
        .or_else(|_| DateTime::parse_from_rfc3339(text))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rss_pub_date_keeps_offset() {
        let body = br#"<rss><channel><item>
            <title>One</title>
            <pubDate>Tue, 05 Mar 2024 14:30:00 +0100</pubDate>
        </item></channel></rss>"#;

        let entries = scan_entries(body).unwrap();
        assert_eq!(entries.len(), 1);
        let published = entries[0].published.unwrap();
        assert_eq!(published.offset().local_minus_utc(), 3600);
        assert_eq!(published.to_rfc3339(), "2024-03-05T14:30:00+01:00");
    }

    #[test]
    fn test_atom_dates() {
        let body = br#"<feed xmlns="http://www.w3.org/2005/Atom"><entry>
            <published>2024-01-01T08:00:00-05:00</published>
            <updated>2024-01-02T08:00:00+02:00</updated>
            <source><updated>1999-01-01T00:00:00Z</updated></source>
        </entry></feed>"#;

        let entries = scan_entries(body).unwrap();
        assert_eq!(entries[0].published.unwrap().offset().local_minus_utc(), -5 * 3600);
        assert_eq!(entries[0].updated.unwrap().to_rfc3339(), "2024-01-02T08:00:00+02:00");
    }

    #[test]
    fn test_only_rss_enclosures_collected() {
        let body = br#"<rss xmlns:media="http://search.yahoo.com/mrss/"><channel>
            <item>
              <enclosure url="https://e.com/a.jpg" type="image/jpeg" length="1"/>
            </item>
            <item>
              <media:content url="https://e.com/m.jpg" type="image/jpeg"/>
            </item>
        </channel></rss>"#;

        let entries = scan_entries(body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].enclosures,
            vec![RawEnclosure {
                url: "https://e.com/a.jpg".into(),
                media_type: Some("image/jpeg".into()),
            }]
        );
        assert!(entries[1].enclosures.is_empty());
    }

    #[test]
    fn test_unparseable_date_is_none() {
        let body = b"<rss><channel><item><pubDate>sometime</pubDate></item></channel></rss>";
        let entries = scan_entries(body).unwrap();
        assert_eq!(entries[0].published, None);
    }

    #[test]
    fn test_malformed_document() {
        assert!(scan_entries(b"<rss><channel><item></channel></rss>").is_none());
    }
}
