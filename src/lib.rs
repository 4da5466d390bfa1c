//! # Eddy
//!
//! A personal feed cache: pages of subscribed feeds, each holding the
//! articles of its last successful fetch, refreshed on demand once they
//! are older than the expiration window.
//!
//! ## Architecture
//!
//! ```text
//! Fetcher → Normalizer → Cache ⇄ Store
//!                          ↑
//!                       Service ← caller
//! ```
//!
//! - [`fetcher`]: HTTP retrieval and concurrent icon lookups
//! - [`normalizer`]: RSS/Atom parsing and entry → item mapping
//! - [`store`]: the cache persisted as one blob in SQLite
//! - [`service`]: cache-or-refresh decisions and the caller-facing operations
//!
//! ## Quick Start
//!
//! ```bash
//! # List pages (seeds the cache from the bundled OPML on first run)
//! eddy pages
//!
//! # Items of the first visible feed of page 0
//! eddy items 0 0
//!
//! # Render an article
//! eddy read 0 0 3
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together config, store,
/// fetcher and service.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Configuration loaded from `~/.config/eddy/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`Cache`](domain::Cache): ordered pages, owner of everything below
/// - [`Page`](domain::Page): a named group of feeds
/// - [`Feed`](domain::Feed): one subscription and its fetched items
/// - [`Item`](domain::Item): one article, linked to its feed by [`FeedId`](domain::FeedId)
pub mod domain;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): async transport trait
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
/// - [`FeedFetcher`](fetcher::FeedFetcher): fetch + parse
/// - [`ParallelFetcher`](fetcher::parallel::ParallelFetcher): concurrent icon lookups with semaphore
pub mod fetcher;

/// Feed parsing and normalization.
pub mod normalizer;

/// OPML import used to seed an empty cache.
pub mod opml;

/// Article rendering to a small HTML document.
pub mod renderer;

/// The operations the presentation layer calls.
pub mod service;

/// Cache persistence.
///
/// - [`BlobStore`](store::BlobStore): keyed byte storage
/// - [`CacheStore`](store::CacheStore): the cache as a JSON blob
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
