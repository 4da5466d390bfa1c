pub mod http_fetcher;
pub mod parallel;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::app::Result;
use crate::domain::{FeedId, Item};
use crate::normalizer::{Normalizer, SyndicationDocument};

/// Transport: one GET, returning the response body.
#[async_trait]
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Retrieves and parses syndication documents over a [`Fetcher`].
#[derive(Clone)]
pub struct FeedFetcher {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    normalizer: Normalizer,
}

impl FeedFetcher {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self {
            fetcher,
            normalizer: Normalizer::new(),
        }
    }

    pub async fn fetch_feed_document(&self, url: &str) -> Result<SyndicationDocument> {
        let body = self.fetcher.fetch(url).await?;
        debug!("Fetched {} bytes from {}", body.len(), url);
        self.normalizer.parse(&body)
    }

    /// Fetch only the feed-level image. A feed without one is not an error.
    pub async fn fetch_feed_image(&self, url: &str) -> Result<Option<String>> {
        let document = self.fetch_feed_document(url).await?;
        Ok(document.image_url)
    }

    /// Fetch a feed and build its complete item list. Nothing is returned
    /// unless every entry maps cleanly.
    pub async fn fetch_items(&self, feed_id: FeedId, url: &str) -> Result<Vec<Item>> {
        let document = self.fetch_feed_document(url).await?;
        self.normalizer.to_items(feed_id, url, &document)
    }
}
