use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::Item;

/// Icon shown until a feed's own image has been fetched.
pub const PLACEHOLDER_ICON: &str = "resources/rss-icon.jpg";

static SUPPORTED_ICON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("(jpg|jpeg|png)$").expect("icon pattern is valid"));

/// Stable key of a feed within its cache. Items refer to their feed by this
/// key instead of holding a pointer to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub id: FeedId,
    pub url: String,
    pub title: String,
    pub image_url: String,
    pub items: Vec<Item>,
    /// `None` until the first successful refresh.
    pub last_refreshed: Option<DateTime<Utc>>,
    pub is_visible: bool,
}

impl Feed {
    /// A new subscription: visible, placeholder icon, never fetched.
    ///
    /// The id is assigned when the feed is added to a [`Cache`](crate::domain::Cache).
    pub fn new(url: String, title: String) -> Self {
        Self {
            id: FeedId(0),
            url,
            title,
            image_url: PLACEHOLDER_ICON.to_string(),
            items: Vec::new(),
            last_refreshed: None,
            is_visible: true,
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.url
        } else {
            &self.title
        }
    }

    /// Whether the cached items may be served without going to the network.
    ///
    /// A feed that was never refreshed, or that holds no items, is never fresh.
    pub fn is_fresh(&self, now: DateTime<Utc>, window: Duration) -> bool {
        if self.items.is_empty() {
            return false;
        }
        match self.last_refreshed {
            Some(refreshed) => now - refreshed <= window,
            None => false,
        }
    }

    /// Swap in the result of a successful fetch. Items and timestamp always
    /// change together.
    pub fn replace_items(&mut self, mut items: Vec<Item>, refreshed_at: DateTime<Utc>) {
        for item in &mut items {
            item.feed_id = self.id;
        }
        self.items = items;
        self.last_refreshed = Some(refreshed_at);
    }

    /// Adopt a fetched feed image if it is a format we can display.
    /// Returns whether the icon changed.
    pub fn apply_icon(&mut self, uri: &str) -> bool {
        if !SUPPORTED_ICON.is_match(uri) {
            return false;
        }
        self.image_url = uri.to_string();
        true
    }
}
