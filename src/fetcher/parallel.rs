use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::app::{EddyError, Result};
use crate::domain::FeedId;
use crate::fetcher::FeedFetcher;

pub const DEFAULT_WORKERS: usize = 10;

/// Feed whose image should be looked up.
#[derive(Debug, Clone)]
pub struct IconRequest {
    pub feed_id: FeedId,
    pub url: String,
}

/// Runs many image lookups at once, bounded by a worker count.
pub struct ParallelFetcher {
    fetcher: FeedFetcher,
    semaphore: Arc<Semaphore>,
}

impl ParallelFetcher {
    pub fn with_workers(fetcher: FeedFetcher, workers: usize) -> Self {
        Self {
            fetcher,
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Fetch every feed image concurrently and return once all of them have
    /// finished, one result per request in request order.
    pub async fn fetch_images(
        &self,
        requests: Vec<IconRequest>,
    ) -> Vec<(FeedId, Result<Option<String>>)> {
        let mut ids = Vec::with_capacity(requests.len());
        let mut handles = Vec::with_capacity(requests.len());

        for request in requests {
            let fetcher = self.fetcher.clone();
            let semaphore = self.semaphore.clone();

            ids.push(request.feed_id);
            handles.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| EddyError::Other(format!("Worker pool closed: {}", e)))?;
                fetcher.fetch_feed_image(&request.url).await
            }));
        }

        join_all(handles)
            .await
            .into_iter()
            .zip(ids)
            .map(|(joined, feed_id)| {
                let result = joined.unwrap_or_else(|e| {
                    tracing::error!("Task join error: {}", e);
                    Err(EddyError::Other(format!("Icon task failed: {}", e)))
                });
                (feed_id, result)
            })
            .collect()
    }
}
