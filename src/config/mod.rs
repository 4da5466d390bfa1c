//! Configuration management for Eddy.
//!
//! Configuration is read from `~/.config/eddy/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::fetcher::parallel::DEFAULT_WORKERS;

pub const DEFAULT_EXPIRE_MINUTES: i64 = 30;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CacheConfig,
    pub fetch: FetchConfig,
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Database file; defaults to the platform data directory.
    pub path: Option<PathBuf>,
    /// How long fetched items are served without refreshing.
    pub expire_minutes: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: None,
            expire_minutes: DEFAULT_EXPIRE_MINUTES,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Upper bound on concurrent icon fetches.
    pub workers: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: concat!("eddy/", env!("CARGO_PKG_VERSION")).to_string(),
            workers: DEFAULT_WORKERS,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// OPML file used instead of the bundled subscription list.
    pub opml: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/eddy/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("eddy").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> String {
        r##"# Eddy Configuration

[cache]
# Database file holding the cached pages, feeds and articles.
# Defaults to the platform data directory (e.g. ~/.local/share/eddy/cache.db).
# path = "/path/to/cache.db"

# Minutes a fetched feed is served from the cache before it is refreshed
expire_minutes = 30

[fetch]
# HTTP timeout in seconds
timeout_secs = 10

# Maximum concurrent requests when fetching feed icons
workers = 10

[bootstrap]
# OPML file used to seed an empty cache instead of the bundled list
# opml = "/path/to/subscriptions.opml"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
