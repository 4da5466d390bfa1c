use std::path::PathBuf;
use std::sync::Arc;

use chrono::Duration;

use crate::app::error::{EddyError, Result};
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::Fetcher;
use crate::opml::BUNDLED_OPML;
use crate::service::{FeedService, ServiceOptions};
use crate::store::sqlite::SqliteStore;

pub struct AppContext {
    pub config: Config,
    pub service: FeedService<SqliteStore>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let db_path = match config.cache.path.clone() {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let store = SqliteStore::new(&db_path)?;
        Self::with_store(config, store)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        Self::with_store(config, SqliteStore::in_memory()?)
    }

    fn with_store(config: Config, store: SqliteStore) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(&config.fetch)?);
        let options = Self::service_options(&config)?;
        let service = FeedService::new(store, fetcher, options);

        Ok(Self { config, service })
    }

    fn service_options(config: &Config) -> Result<ServiceOptions> {
        let opml = match &config.bootstrap.opml {
            Some(path) => std::fs::read_to_string(path)?,
            None => BUNDLED_OPML.to_string(),
        };

        Ok(ServiceOptions {
            expire: Duration::minutes(config.cache.expire_minutes),
            workers: config.fetch.workers,
            opml,
        })
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| EddyError::Config("Could not find data directory".into()))?;
        let eddy_dir = data_dir.join("eddy");
        std::fs::create_dir_all(&eddy_dir)?;
        Ok(eddy_dir.join("cache.db"))
    }
}
