use serde::{Deserialize, Serialize};

use crate::domain::Feed;

/// A named group of subscriptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub title: String,
    pub feeds: Vec<Feed>,
}

impl Page {
    pub fn new(title: String) -> Self {
        Self {
            title,
            feeds: Vec::new(),
        }
    }

    /// Feeds the user has not hidden, in subscription order.
    pub fn visible_feeds(&self) -> impl Iterator<Item = &Feed> {
        self.feeds.iter().filter(|f| f.is_visible)
    }

    /// Resolve an index counted over visible feeds only.
    pub fn visible_feed(&self, index: usize) -> Option<&Feed> {
        self.visible_feeds().nth(index)
    }

    pub fn visible_count(&self) -> usize {
        self.visible_feeds().count()
    }
}
