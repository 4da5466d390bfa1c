use serde::{Deserialize, Serialize};

use crate::app::{EddyError, Result};
use crate::domain::{Feed, FeedId, Page};

/// Root of the page → feed → item tree. Persisted as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cache {
    pub pages: Vec<Page>,
    #[serde(default)]
    next_feed_id: u64,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Append pages in the given order, assigning fresh ids to their feeds.
    pub fn add_pages(&mut self, pages: Vec<Page>) {
        for mut page in pages {
            for feed in &mut page.feeds {
                feed.id = self.allocate_id();
                for item in &mut feed.items {
                    item.feed_id = feed.id;
                }
            }
            self.pages.push(page);
        }
    }

    fn allocate_id(&mut self) -> FeedId {
        self.next_feed_id += 1;
        FeedId(self.next_feed_id)
    }

    pub fn page(&self, page_id: usize) -> Result<&Page> {
        self.pages
            .get(page_id)
            .ok_or(EddyError::PageNotFound(page_id))
    }

    pub fn page_mut(&mut self, page_id: usize) -> Result<&mut Page> {
        self.pages
            .get_mut(page_id)
            .ok_or(EddyError::PageNotFound(page_id))
    }

    /// Visible-index lookup. An unknown page is an error, an index past the
    /// visible feeds is `None`.
    pub fn visible_feed(&self, page_id: usize, feed_id: usize) -> Result<Option<&Feed>> {
        Ok(self.page(page_id)?.visible_feed(feed_id))
    }

    pub fn feeds(&self) -> impl Iterator<Item = &Feed> {
        self.pages.iter().flat_map(|p| p.feeds.iter())
    }

    pub fn feed(&self, id: FeedId) -> Option<&Feed> {
        self.feeds().find(|f| f.id == id)
    }

    pub fn feed_mut(&mut self, id: FeedId) -> Option<&mut Feed> {
        self.pages
            .iter_mut()
            .flat_map(|p| p.feeds.iter_mut())
            .find(|f| f.id == id)
    }

    /// Restore the item → feed links after deserialization.
    ///
    /// Every item is re-stamped with the id of the feed holding it, feeds
    /// with a missing or duplicate id get a new one, and the allocator is
    /// moved past the highest id in use.
    pub fn relink(&mut self) {
        let mut seen = std::collections::HashSet::new();
        let highest = self.feeds().map(|f| f.id.0).max().unwrap_or(0);
        self.next_feed_id = self.next_feed_id.max(highest);

        let mut next = self.next_feed_id;
        for feed in self.pages.iter_mut().flat_map(|p| p.feeds.iter_mut()) {
            if feed.id.0 == 0 || !seen.insert(feed.id) {
                next += 1;
                feed.id = FeedId(next);
                seen.insert(feed.id);
            }
            for item in &mut feed.items {
                item.feed_id = feed.id;
            }
        }
        self.next_feed_id = next;
    }
}
