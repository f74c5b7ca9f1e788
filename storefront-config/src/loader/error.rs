use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error(
        "the catalog API base URL is not configured; set STOREFRONT_API_URL or api.base_url"
    )]
    MissingApiBaseUrl,
    #[error("invalid catalog API base URL '{value}'")]
    InvalidApiBaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("catalog API base URL '{0}' must use http or https")]
    UnsupportedScheme(String),
    #[error("invalid site URL '{value}'")]
    InvalidSiteUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("failed to read config file {path}")]
    ConfigFileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}")]
    ConfigFileParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

impl ConfigLoadError {
    /// Whether the error means the search view cannot work at all, as
    /// opposed to a typo in a tuning knob.
    pub fn is_missing_endpoint(&self) -> bool {
        matches!(
            self,
            Self::MissingApiBaseUrl
                | Self::InvalidApiBaseUrl { .. }
                | Self::UnsupportedScheme(_)
        )
    }
}
