pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "eddy")]
#[command(about = "A caching RSS/Atom reader", long_about = None)]
pub struct Cli {
    /// Path to an alternative config file
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List pages
    Pages,
    /// List the visible feeds of a page
    Feeds {
        /// Page index
        page: usize,
    },
    /// Show the items of a feed, refreshing them when stale
    Items {
        /// Page index
        page: usize,
        /// Feed index among visible feeds
        feed: usize,
        /// Ignore cached items and fetch
        #[arg(long)]
        refresh: bool,
    },
    /// Print an article as HTML
    Read {
        page: usize,
        feed: usize,
        /// Item index within the feed
        item: usize,
    },
    /// Search cached item titles of a feed
    Search {
        page: usize,
        feed: usize,
        query: String,
    },
    /// Hide a feed
    Hide {
        page: usize,
        /// Feed index among all feeds of the page
        index: usize,
    },
    /// Show a previously hidden feed
    Show {
        page: usize,
        /// Feed index among all feeds of the page
        index: usize,
    },
}
