//! Orchestration between the cache, the fetcher and the caller.
//!
//! Every refresh request goes through one decision: serve the cached items
//! when the caller allows it and they are fresh, otherwise fetch. Fetched
//! items replace the feed's items in a single write, so a failed fetch never
//! touches the cache.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{Duration, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::app::{EddyError, Result, CONNECTIVITY_NOTICE};
use crate::config::DEFAULT_EXPIRE_MINUTES;
use crate::domain::{Cache, Feed, FeedId, Item, Page};
use crate::fetcher::parallel::{IconRequest, ParallelFetcher, DEFAULT_WORKERS};
use crate::fetcher::{FeedFetcher, Fetcher};
use crate::opml::{parse_opml, BUNDLED_OPML};
use crate::renderer::render_article;
use crate::store::{BlobStore, CacheStore};


#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// Freshness window for cached items.
    pub expire: Duration,
    pub workers: usize,
    /// OPML document used to seed an empty cache.
    pub opml: String,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            expire: Duration::minutes(DEFAULT_EXPIRE_MINUTES),
            workers: DEFAULT_WORKERS,
            opml: BUNDLED_OPML.to_string(),
        }
    }
}

/// Where a delivered item list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemSource {
    Cache,
    Network,
}

#[derive(Debug, Clone)]
pub struct Delivery {
    pub items: Vec<Item>,
    pub source: ItemSource,
}

/// Feed to refresh, captured while the cache lock was held.
#[derive(Debug, Clone)]
pub struct RefreshTarget {
    pub feed_id: FeedId,
    pub url: String,
}

#[derive(Debug, Clone)]
pub enum Decision {
    CacheHit(Vec<Item>),
    Fetch(RefreshTarget),
}

/// Outcome of a feed icon batch, available only once every fetch finished.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IconReport {
    pub attempted: usize,
    pub updated: usize,
    pub failed: usize,
}

impl IconReport {
    pub fn notice(&self) -> Option<&'static str> {
        (self.failed > 0).then_some(CONNECTIVITY_NOTICE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    /// The cache was empty and has been seeded from OPML.
    pub bootstrapped: bool,
    pub icons: Option<IconReport>,
}

impl InitReport {
    pub fn notice(&self) -> Option<&'static str> {
        self.icons.as_ref().and_then(IconReport::notice)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSummary {
    pub index: usize,
    pub title: String,
    pub visible_feeds: usize,
}

pub struct FeedService<S: BlobStore> {
    cache: Arc<RwLock<Cache>>,
    store: Arc<CacheStore<S>>,
    fetcher: FeedFetcher,
    icons: Arc<ParallelFetcher>,
    options: Arc<ServiceOptions>,
    initialized: Arc<AtomicBool>,
}

impl<S: BlobStore> Clone for FeedService<S> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            store: self.store.clone(),
            fetcher: self.fetcher.clone(),
            icons: self.icons.clone(),
            options: self.options.clone(),
            initialized: self.initialized.clone(),
        }
    }
}

impl<S: BlobStore + Send + Sync + 'static> FeedService<S> {
    pub fn new(store: S, fetcher: Arc<dyn Fetcher + Send + Sync>, options: ServiceOptions) -> Self {
        let fetcher = FeedFetcher::new(fetcher);
        let icons = ParallelFetcher::with_workers(fetcher.clone(), options.workers);

        Self {
            cache: Arc::new(RwLock::new(Cache::new())),
            store: Arc::new(CacheStore::new(store)),
            fetcher,
            icons: Arc::new(icons),
            options: Arc::new(options),
            initialized: Arc::new(AtomicBool::new(false)),
        }
    }

    fn read_cache(&self) -> Result<RwLockReadGuard<'_, Cache>> {
        self.cache
            .read()
            .map_err(|e| EddyError::Other(format!("Cache lock poisoned: {}", e)))
    }

    fn write_cache(&self) -> Result<RwLockWriteGuard<'_, Cache>> {
        self.cache
            .write()
            .map_err(|e| EddyError::Other(format!("Cache lock poisoned: {}", e)))
    }

    /// Load the persisted cache, seeding it from OPML on first launch.
    ///
    /// Only the first successful call does any work.
    pub async fn initialize_feeds(&self) -> Result<InitReport> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!("Feeds already initialized");
            return Ok(InitReport::default());
        }

        let result = self.seed_cache();
        let bootstrapped = match result {
            Ok(bootstrapped) => bootstrapped,
            Err(e) => {
                self.initialized.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        if !bootstrapped {
            return Ok(InitReport::default());
        }

        let icons = self.prefetch_feed_images().await?;
        if let Some(notice) = icons.notice() {
            warn!("{}", notice);
        }

        Ok(InitReport {
            bootstrapped: true,
            icons: Some(icons),
        })
    }

    fn seed_cache(&self) -> Result<bool> {
        let loaded = self.store.load();
        let mut cache = self.write_cache()?;
        *cache = loaded;

        if !cache.is_empty() {
            info!("Loaded {} pages from cache", cache.pages.len());
            return Ok(false);
        }

        let pages = parse_opml(&self.options.opml)?;
        info!("First launch: importing {} pages from OPML", pages.len());
        cache.add_pages(pages);
        Ok(true)
    }

    /// Fetch the image of every feed concurrently, adopting the usable ones.
    ///
    /// Individual failures are only counted; the report is produced after
    /// the whole batch has completed.
    pub async fn prefetch_feed_images(&self) -> Result<IconReport> {
        let requests: Vec<IconRequest> = self
            .read_cache()?
            .feeds()
            .map(|feed| IconRequest {
                feed_id: feed.id,
                url: feed.url.clone(),
            })
            .collect();

        let mut report = IconReport {
            attempted: requests.len(),
            ..Default::default()
        };

        let results = self.icons.fetch_images(requests).await;

        let mut cache = self.write_cache()?;
        for (feed_id, result) in results {
            match result {
                Ok(Some(uri)) => {
                    if let Some(feed) = cache.feed_mut(feed_id) {
                        if feed.apply_icon(&uri) {
                            report.updated += 1;
                        }
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    debug!("Icon fetch failed for feed {:?}: {}", feed_id, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Feed icons: {} fetched, {} updated, {} failed",
            report.attempted, report.updated, report.failed
        );
        Ok(report)
    }

    pub fn get_page(&self, page_id: usize) -> Result<Page> {
        let cache = self.read_cache()?;
        cache.page(page_id).cloned().inspect_err(|e| error!("{}", e))
    }

    /// `feed_id` counts visible feeds only.
    pub fn get_feed(&self, page_id: usize, feed_id: usize) -> Result<Option<Feed>> {
        let cache = self.read_cache()?;
        let feed = cache
            .visible_feed(page_id, feed_id)
            .inspect_err(|e| error!("{}", e))?;
        Ok(feed.cloned())
    }

    pub fn list_pages(&self) -> Result<Vec<PageSummary>> {
        let cache = self.read_cache()?;
        Ok(cache
            .pages
            .iter()
            .enumerate()
            .map(|(index, page)| PageSummary {
                index,
                title: page.title.clone(),
                visible_feeds: page.visible_count(),
            })
            .collect())
    }

    pub fn get_item(&self, page_id: usize, feed_id: usize, item_id: usize) -> Result<Item> {
        let feed = self
            .get_feed(page_id, feed_id)?
            .ok_or(EddyError::FeedNotFound {
                page: page_id,
                feed: feed_id,
            })?;
        feed.items
            .into_iter()
            .nth(item_id)
            .ok_or(EddyError::ItemNotFound(item_id))
    }

    /// Cached items of a feed whose title contains `query`, ignoring case.
    pub fn search_items(&self, page_id: usize, feed_id: usize, query: &str) -> Result<Vec<Item>> {
        let feed = self
            .get_feed(page_id, feed_id)?
            .ok_or(EddyError::FeedNotFound {
                page: page_id,
                feed: feed_id,
            })?;
        Ok(feed
            .items
            .into_iter()
            .filter(|item| item.matches_title(query))
            .collect())
    }

    /// Show or hide a subscription. `feed_index` addresses all feeds of the
    /// page, hidden ones included.
    pub fn set_feed_visibility(&self, page_id: usize, feed_index: usize, visible: bool) -> Result<()> {
        let mut cache = self.write_cache()?;
        let page = cache.page_mut(page_id)?;
        let feed = page
            .feeds
            .get_mut(feed_index)
            .ok_or(EddyError::FeedNotFound {
                page: page_id,
                feed: feed_index,
            })?;
        feed.is_visible = visible;
        debug!("Feed {} visibility set to {}", feed.url, visible);
        Ok(())
    }

    /// Decide between serving cached items and fetching.
    pub fn decide(&self, page_id: usize, feed_id: usize, use_cache: bool) -> Result<Decision> {
        let cache = self.read_cache()?;
        let feed = cache
            .visible_feed(page_id, feed_id)?
            .ok_or(EddyError::FeedNotFound {
                page: page_id,
                feed: feed_id,
            })?;

        if use_cache && feed.is_fresh(Utc::now(), self.options.expire) {
            debug!("Serving {} items of {} from cache", feed.items.len(), feed.url);
            return Ok(Decision::CacheHit(feed.items.clone()));
        }

        Ok(Decision::Fetch(RefreshTarget {
            feed_id: feed.id,
            url: feed.url.clone(),
        }))
    }

    /// Fetch a feed and replace its items and timestamp together.
    pub async fn refresh(&self, target: RefreshTarget) -> Result<Vec<Item>> {
        let items = self.fetcher.fetch_items(target.feed_id, &target.url).await?;

        let mut cache = self.write_cache()?;
        let feed = cache
            .feed_mut(target.feed_id)
            .ok_or_else(|| EddyError::Other(format!("Feed {} left the cache", target.url)))?;
        feed.replace_items(items, Utc::now());
        info!("Refreshed {} ({} items)", feed.url, feed.items.len());

        Ok(feed.items.clone())
    }

    pub async fn load_items(&self, page_id: usize, feed_id: usize, use_cache: bool) -> Result<Delivery> {
        match self.decide(page_id, feed_id, use_cache)? {
            Decision::CacheHit(items) => Ok(Delivery {
                items,
                source: ItemSource::Cache,
            }),
            Decision::Fetch(target) => Ok(Delivery {
                items: self.refresh(target).await?,
                source: ItemSource::Network,
            }),
        }
    }

    /// Callback flavour of [`load_items`](Self::load_items).
    ///
    /// A cache hit, or a request that cannot be resolved, reports before this
    /// returns. A fetch runs on a spawned task whose handle is returned; the
    /// caller never waits on the network. Must be called inside a Tokio runtime.
    pub fn get_items<F, E>(
        &self,
        page_id: usize,
        feed_id: usize,
        use_cache: bool,
        on_success: F,
        on_error: E,
    ) -> Option<JoinHandle<()>>
    where
        F: FnOnce(Vec<Item>) + Send + 'static,
        E: FnOnce(EddyError) + Send + 'static,
    {
        let target = match self.decide(page_id, feed_id, use_cache) {
            Ok(Decision::CacheHit(items)) => {
                on_success(items);
                return None;
            }
            Ok(Decision::Fetch(target)) => target,
            Err(e) => {
                error!("Item request rejected: {}", e);
                on_error(e);
                return None;
            }
        };

        let service = self.clone();
        Some(tokio::spawn(async move {
            match service.refresh(target).await {
                Ok(items) => on_success(items),
                Err(e) => {
                    warn!("Refresh failed: {}", e);
                    on_error(e);
                }
            }
        }))
    }

    /// Look up a feed's own image in the background.
    pub fn get_feed_image_uri<F, E>(&self, feed: &Feed, on_success: F, on_error: E) -> JoinHandle<()>
    where
        F: FnOnce(Option<String>, FeedId) + Send + 'static,
        E: FnOnce(EddyError) + Send + 'static,
    {
        let fetcher = self.fetcher.clone();
        let feed_id = feed.id;
        let url = feed.url.clone();

        tokio::spawn(async move {
            match fetcher.fetch_feed_image(&url).await {
                Ok(uri) => on_success(uri, feed_id),
                Err(e) => on_error(e),
            }
        })
    }

    /// Use `uri` as the feed's icon if it is a supported image.
    pub fn apply_feed_image(&self, feed_id: FeedId, uri: &str) -> Result<bool> {
        let mut cache = self.write_cache()?;
        Ok(cache
            .feed_mut(feed_id)
            .map(|feed| feed.apply_icon(uri))
            .unwrap_or(false))
    }

    pub fn create_article_html(&self, item: &Item) -> String {
        render_article(item)
    }

    /// Write the whole cache to storage. Refreshes wait until the write is done,
    /// so the stored copy is always a consistent snapshot.
    pub fn persist_cache(&self) -> Result<()> {
        let cache = self.read_cache()?;
        self.store.save(&cache)
    }

    /// Copy of the current cache.
    pub fn snapshot(&self) -> Result<Cache> {
        Ok(self.read_cache()?.clone())
    }

    /// Mutate the cache directly.
    pub fn with_cache_mut<R>(&self, f: impl FnOnce(&mut Cache) -> R) -> Result<R> {
        let mut cache = self.write_cache()?;
        Ok(f(&mut cache))
    }
}
