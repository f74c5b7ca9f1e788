use std::time::Duration;

use thiserror::Error;

/// Catalog request failures. Cancellation is not an error and never shows up
/// here; see [`super::types::FetchOutcome::Cancelled`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Catalog unreachable: {0}")]
    Transport(String),
    #[error("Catalog responded with status {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Unreadable catalog response: {0}")]
    Decode(String),
    #[error("Catalog request timed out after {after:?}")]
    Timeout { after: Duration },
    #[error("Request could not be built: {0}")]
    InvalidRequest(String),
}

pub type SearchResult<T> = Result<T, SearchError>;

impl SearchError {
    /// Map a reqwest failure, reporting `timeout` when the client gave up.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout { after: timeout }
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_builder() {
            Self::InvalidRequest(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }

    /// Text for the transient notice shown to shoppers.
    pub fn user_message(&self) -> String {
        match self {
            Self::Timeout { .. } => {
                "Search is taking too long. Please try again.".to_string()
            }
            Self::Http { status, .. } if *status >= 500 => {
                "Search is temporarily unavailable.".to_string()
            }
            _ => "Something went wrong while searching.".to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageCacheError {
    #[error("Image is {size} bytes; uploads are limited to {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
    #[error("Unsupported image format")]
    UnsupportedFormat,
    #[error("Image is empty")]
    Empty,
    #[error("Session store quota exceeded ({size} > {quota} bytes)")]
    QuotaExceeded { size: u64, quota: u64 },
    #[error("Session store failure: {0}")]
    Store(String),
    #[error("Malformed image data URL")]
    MalformedDataUrl,
}

impl From<cacache::Error> for ImageCacheError {
    fn from(err: cacache::Error) -> Self {
        Self::Store(err.to_string())
    }
}
