use std::time::Duration;

pub const ENV_CONFIG_PATH: &str = "STOREFRONT_CONFIG_PATH";
pub const ENV_API_URL: &str = "STOREFRONT_API_URL";
pub const ENV_STORE_ID: &str = "STOREFRONT_STORE_ID";
pub const ENV_API_TOKEN: &str = "STOREFRONT_API_TOKEN";
pub const ENV_SITE_URL: &str = "STOREFRONT_SITE_URL";
pub const ENV_PAGE_SIZE: &str = "STOREFRONT_PAGE_SIZE";
pub const ENV_SUGGESTION_LIMIT: &str = "STOREFRONT_SUGGESTION_LIMIT";
pub const ENV_MIN_QUERY_CHARS: &str = "STOREFRONT_MIN_QUERY_CHARS";
pub const ENV_COMMIT_DEBOUNCE: &str = "STOREFRONT_COMMIT_DEBOUNCE";
pub const ENV_SUGGEST_DEBOUNCE: &str = "STOREFRONT_SUGGEST_DEBOUNCE";
pub const ENV_HOME_REDIRECT_DELAY: &str = "STOREFRONT_HOME_REDIRECT_DELAY";
pub const ENV_REQUEST_TIMEOUT: &str = "STOREFRONT_REQUEST_TIMEOUT";
pub const ENV_IMAGE_SESSION_QUOTA: &str = "STOREFRONT_IMAGE_SESSION_QUOTA";
pub const ENV_IMAGE_MAX_UPLOAD: &str = "STOREFRONT_IMAGE_MAX_UPLOAD";
pub const ENV_IMAGE_CACHE_DIR: &str = "STOREFRONT_IMAGE_CACHE_DIR";

/// Every key the loader understands, used to seed test environments.
pub const MANAGED_KEYS: &[&str] = &[
    ENV_CONFIG_PATH,
    ENV_API_URL,
    ENV_STORE_ID,
    ENV_API_TOKEN,
    ENV_SITE_URL,
    ENV_PAGE_SIZE,
    ENV_SUGGESTION_LIMIT,
    ENV_MIN_QUERY_CHARS,
    ENV_COMMIT_DEBOUNCE,
    ENV_SUGGEST_DEBOUNCE,
    ENV_HOME_REDIRECT_DELAY,
    ENV_REQUEST_TIMEOUT,
    ENV_IMAGE_SESSION_QUOTA,
    ENV_IMAGE_MAX_UPLOAD,
    ENV_IMAGE_CACHE_DIR,
];

pub const DEFAULT_CONFIG_FILES: &[&str] =
    &["storefront.toml", "config/storefront.toml"];

pub const DEFAULT_SITE_URL: &str = "http://localhost:3000";
pub const DEFAULT_PAGE_SIZE: u32 = 24;
pub const DEFAULT_SUGGESTION_LIMIT: usize = 8;
pub const MAX_SUGGESTION_LIMIT: usize = 50;
pub const DEFAULT_MIN_QUERY_CHARS: usize = 2;
pub const DEFAULT_COMMIT_DEBOUNCE: Duration = Duration::from_millis(500);
pub const DEFAULT_SUGGEST_DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_HOME_REDIRECT_DELAY: Duration = Duration::from_millis(300);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Roughly what browsers allow a single origin in session storage.
pub const DEFAULT_IMAGE_SESSION_QUOTA: u64 = 5 * 1024 * 1024;
pub const DEFAULT_IMAGE_MAX_UPLOAD: u64 = 10 * 1024 * 1024;
