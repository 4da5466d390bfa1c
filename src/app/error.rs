use thiserror::Error;

/// The one message shown to users for any fetch failure.
pub const CONNECTIVITY_NOTICE: &str =
    "Application failed to retrieve content from server. Please check your network connectivity.";

#[derive(Error, Debug)]
pub enum EddyError {
    #[error("Network error: {0}")]
    Network(reqwest::Error),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("OPML parsing error: {0}")]
    OpmlParse(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Storage migration error: {0}")]
    Migration(#[from] rusqlite_migration::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Page index {0} out of range")]
    PageNotFound(usize),

    #[error("Feed not found: page {page}, feed {feed}")]
    FeedNotFound { page: usize, feed: usize },

    #[error("Item not found: {0}")]
    ItemNotFound(usize),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for EddyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EddyError::Timeout(err.to_string())
        } else {
            EddyError::Network(err)
        }
    }
}

/// Coarse classification used by callers that want to branch on the
/// failure category rather than the concrete cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Parse,
    Timeout,
    Storage,
    Precondition,
    Other,
}

impl EddyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EddyError::Network(_) | EddyError::InvalidUrl(_) => ErrorKind::Network,
            EddyError::Timeout(_) => ErrorKind::Timeout,
            EddyError::FeedParse(_) | EddyError::OpmlParse(_) => ErrorKind::Parse,
            EddyError::Storage(_)
            | EddyError::Migration(_)
            | EddyError::Serialization(_)
            | EddyError::Io(_) => ErrorKind::Storage,
            EddyError::PageNotFound(_)
            | EddyError::FeedNotFound { .. }
            | EddyError::ItemNotFound(_) => ErrorKind::Precondition,
            EddyError::Config(_) | EddyError::Other(_) => ErrorKind::Other,
        }
    }

    /// User-facing notice for failures that came from fetching content.
    pub fn notice(&self) -> Option<&'static str> {
        match self.kind() {
            ErrorKind::Network | ErrorKind::Parse | ErrorKind::Timeout => {
                Some(CONNECTIVITY_NOTICE)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, EddyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(EddyError::Timeout("slow".into()).kind(), ErrorKind::Timeout);
        assert_eq!(EddyError::FeedParse("bad".into()).kind(), ErrorKind::Parse);
        assert_eq!(EddyError::OpmlParse("bad".into()).kind(), ErrorKind::Parse);
        assert_eq!(EddyError::PageNotFound(9).kind(), ErrorKind::Precondition);
        assert_eq!(
            EddyError::FeedNotFound { page: 0, feed: 3 }.kind(),
            ErrorKind::Precondition
        );
        assert_eq!(
            EddyError::Storage(rusqlite::Error::InvalidQuery).kind(),
            ErrorKind::Storage
        );
    }

    #[test]
    fn test_notice_only_for_fetch_failures() {
        assert_eq!(
            EddyError::Timeout("slow".into()).notice(),
            Some(CONNECTIVITY_NOTICE)
        );
        assert_eq!(
            EddyError::FeedParse("bad".into()).notice(),
            Some(CONNECTIVITY_NOTICE)
        );
        assert_eq!(EddyError::PageNotFound(1).notice(), None);
        assert_eq!(EddyError::Config("x".into()).notice(), None);
    }
}
