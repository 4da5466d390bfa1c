pub mod sqlite;

use tracing::{debug, info, warn};

use crate::app::Result;
use crate::domain::Cache;

pub use sqlite::SqliteStore;

/// Key under which the whole cache is persisted.
pub const CACHE_KEY: &str = "feed-cache";

/// Durable byte storage addressed by key.
///
/// `save` must replace the value in one step: a concurrent `load` sees the
/// previous bytes or the new ones, never a mix.
pub trait BlobStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn save(&self, key: &str, data: &[u8]) -> Result<()>;
}

/// Persists the [`Cache`] as a single JSON blob.
pub struct CacheStore<S: BlobStore> {
    blobs: S,
}

impl<S: BlobStore> CacheStore<S> {
    pub fn new(blobs: S) -> Self {
        Self { blobs }
    }

    /// Read the persisted cache.
    ///
    /// Missing or unreadable state yields an empty cache; first launch is not
    /// an error.
    pub fn load(&self) -> Cache {
        let bytes = match self.blobs.load(CACHE_KEY) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                info!("No persisted cache, starting empty");
                return Cache::new();
            }
            Err(e) => {
                warn!("Failed to read persisted cache: {}", e);
                return Cache::new();
            }
        };

        match serde_json::from_slice::<Cache>(&bytes) {
            Ok(mut cache) => {
                cache.relink();
                debug!("Loaded cache with {} pages", cache.pages.len());
                cache
            }
            Err(e) => {
                warn!("Persisted cache is unreadable, starting empty: {}", e);
                Cache::new()
            }
        }
    }

    pub fn save(&self, cache: &Cache) -> Result<()> {
        let bytes = serde_json::to_vec(cache)?;
        self.blobs.save(CACHE_KEY, &bytes)?;
        debug!("Persisted cache ({} bytes)", bytes.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::EddyError;
    use crate::domain::{Feed, Item, Page};
    use chrono::{DateTime, Utc};

    struct FailingStore;

    impl BlobStore for FailingStore {
        fn load(&self, _key: &str) -> Result<Option<Vec<u8>>> {
            Err(EddyError::Storage(rusqlite::Error::InvalidQuery))
        }

        fn save(&self, _key: &str, _data: &[u8]) -> Result<()> {
            Err(EddyError::Storage(rusqlite::Error::InvalidQuery))
        }
    }

    fn sample_cache() -> Cache {
        let mut page = Page::new("News".into());
        page.feeds.push(Feed::new("https://a.example.com/rss".into(), "A".into()));
        let mut hidden = Feed::new("https://b.example.com/rss".into(), "B".into());
        hidden.is_visible = false;
        page.feeds.push(hidden);

        let mut cache = Cache::new();
        cache.add_pages(vec![page, Page::new("Empty".into())]);

        let feed = &mut cache.pages[0].feeds[0];
        let mut item = Item::new(
            feed.id,
            "Hello World".into(),
            "<p>Body</p>".into(),
            "https://a.example.com/1".into(),
        );
        item.published = DateTime::parse_from_rfc3339("2024-01-01T09:30:00+02:00").ok();
        item.image = Some("https://a.example.com/1.png".into());
        feed.replace_items(vec![item], Utc::now());
        cache
    }

    #[test]
    fn test_load_without_state_is_empty() {
        let store = CacheStore::new(SqliteStore::in_memory().unwrap());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let store = CacheStore::new(SqliteStore::in_memory().unwrap());
        let cache = sample_cache();
        store.save(&cache).unwrap();

        let loaded = store.load();
        assert_eq!(loaded, cache);
        assert_eq!(loaded.pages[0].title, "News");
        assert_eq!(loaded.pages[1].title, "Empty");
        assert!(!loaded.pages[0].feeds[1].is_visible);
    }

    #[test]
    fn test_round_trip_item_resolves_to_containing_feed() {
        let store = CacheStore::new(SqliteStore::in_memory().unwrap());
        store.save(&sample_cache()).unwrap();

        let loaded = store.load();
        let holder = &loaded.pages[0].feeds[0];
        let item = &holder.items[0];
        let resolved = loaded.feed(item.feed_id).unwrap();
        assert!(std::ptr::eq(resolved, holder));
    }

    #[test]
    fn test_round_trip_keeps_publish_offset() {
        let store = CacheStore::new(SqliteStore::in_memory().unwrap());
        store.save(&sample_cache()).unwrap();

        let loaded = store.load();
        let published = loaded.pages[0].feeds[0].items[0].published.unwrap();
        assert_eq!(published.offset().local_minus_utc(), 2 * 3600);
    }

    #[test]
    fn test_unreadable_blob_falls_back_to_empty() {
        let sqlite = SqliteStore::in_memory().unwrap();
        sqlite.save(CACHE_KEY, b"not json").unwrap();
        let store = CacheStore::new(sqlite);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_storage_failure_on_load_is_empty_cache() {
        let store = CacheStore::new(FailingStore);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_storage_failure_on_save_propagates() {
        let store = CacheStore::new(FailingStore);
        let err = store.save(&sample_cache()).unwrap_err();
        assert!(matches!(err, EddyError::Storage(_)));
    }
}
