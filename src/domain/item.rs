use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::domain::FeedId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub title: String,
    /// Summary as delivered by the feed, markup included.
    pub summary: String,
    pub url: String,
    pub published: Option<DateTime<FixedOffset>>,
    /// Enclosure image; when absent the renderer falls back to the body.
    pub image: Option<String>,
    /// Key of the owning feed inside the [`Cache`](crate::domain::Cache).
    pub feed_id: FeedId,
}

impl Item {
    pub fn new(feed_id: FeedId, title: String, summary: String, url: String) -> Self {
        Self {
            title,
            summary,
            url,
            published: None,
            image: None,
            feed_id,
        }
    }

    /// Collapse every line-break sequence into a single space.
    pub fn normalize_title(title: &str) -> String {
        title
            .replace("\r\n", "\n")
            .replace('\r', "\n")
            .replace('\n', " ")
    }

    pub fn matches_title(&self, query: &str) -> bool {
        self.title.to_lowercase().contains(&query.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_title_crlf() {
        assert_eq!(Item::normalize_title("Hello\r\nWorld"), "Hello World");
    }

    #[test]
    fn test_normalize_title_mixed_breaks() {
        assert_eq!(Item::normalize_title("a\rb\nc\r\nd"), "a b c d");
    }

    #[test]
    fn test_normalize_title_keeps_single_line() {
        assert_eq!(Item::normalize_title("Plain title"), "Plain title");
    }

    #[test]
    fn test_matches_title_case_insensitive() {
        let item = Item::new(
            FeedId(1),
            "Rust Release Notes".into(),
            String::new(),
            "https://example.com/a".into(),
        );
        assert!(item.matches_title("release"));
        assert!(item.matches_title("RUST"));
        assert!(item.matches_title(""));
        assert!(!item.matches_title("python"));
    }
}
