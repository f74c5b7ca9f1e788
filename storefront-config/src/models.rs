use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::constants::{
    DEFAULT_COMMIT_DEBOUNCE, DEFAULT_HOME_REDIRECT_DELAY,
    DEFAULT_IMAGE_MAX_UPLOAD, DEFAULT_IMAGE_SESSION_QUOTA,
    DEFAULT_MIN_QUERY_CHARS, DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_SITE_URL, DEFAULT_SUGGEST_DEBOUNCE, DEFAULT_SUGGESTION_LIMIT,
};

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub site: SiteConfig,
    pub search: SearchConfig,
    pub images: ImageConfig,
    pub metadata: ConfigMetadata,
}

impl Config {
    /// Defaults around a known API base URL. Handy for tests and embedding.
    pub fn with_api(base_url: Url) -> Self {
        Self {
            api: ApiConfig {
                base_url,
                store_id: None,
                token: None,
            },
            site: SiteConfig::default(),
            search: SearchConfig::default(),
            images: ImageConfig::default(),
            metadata: ConfigMetadata::default(),
        }
    }
}

/// Admin/catalog API endpoint.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Whitespace and trailing slashes trimmed; paths are appended to it.
    pub base_url: Url,
    pub store_id: Option<String>,
    /// Optional bearer token. Search endpoints are public.
    pub token: Option<String>,
}

/// Where the storefront itself is served; URLs written by the synchronizer
/// are relative to this origin.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub origin: Url,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            origin: Url::parse(DEFAULT_SITE_URL)
                .expect("default site url is valid"),
        }
    }
}

/// Search timing and paging knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// `limit` sent with every search request.
    pub page_size: u32,
    pub suggestion_limit: usize,
    pub min_query_chars: usize,
    /// Quiet period before typed text is committed to the URL.
    pub commit_debounce: Duration,
    /// Quiet period before suggestions are fetched.
    pub suggest_debounce: Duration,
    /// Delay before an emptied search box sends the user home.
    pub home_redirect_delay: Duration,
    /// Upper bound for every catalog request.
    pub request_timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            min_query_chars: DEFAULT_MIN_QUERY_CHARS,
            commit_debounce: DEFAULT_COMMIT_DEBOUNCE,
            suggest_debounce: DEFAULT_SUGGEST_DEBOUNCE,
            home_redirect_delay: DEFAULT_HOME_REDIRECT_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageConfig {
    /// Largest data URL the primary (session) store accepts before the cache
    /// falls back to memory.
    pub session_quota_bytes: u64,
    /// Largest raw upload accepted at all.
    pub max_upload_bytes: u64,
    /// Fixed directory for the session store. A fresh temp dir per session
    /// when unset.
    pub cache_dir: Option<PathBuf>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            session_quota_bytes: DEFAULT_IMAGE_SESSION_QUOTA,
            max_upload_bytes: DEFAULT_IMAGE_MAX_UPLOAD,
            cache_dir: None,
        }
    }
}

/// Source that produced the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSource {
    #[default]
    Default,
    File(PathBuf),
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub source: ConfigSource,
    pub env_file: Option<PathBuf>,
}
