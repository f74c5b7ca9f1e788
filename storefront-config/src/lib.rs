//! Shared configuration library for the storefront search client.
//!
//! Settings are layered from built-in defaults, an optional TOML file, a
//! `.env` file and finally the process environment. The CLI and the search
//! session both consume the resulting [`Config`] so there is a single source
//! of truth for debounce windows, page sizes and API endpoints.
#![allow(missing_docs)]

pub mod constants;
pub mod loader;
pub mod models;

pub use loader::{ConfigLoad, ConfigLoader, error::ConfigLoadError};
pub use models::{
    ApiConfig, Config, ConfigMetadata, ConfigSource, ImageConfig,
    SearchConfig, SiteConfig,
};
