//! Storefront product search.
//!
//! A headless rendition of the storefront's search page: typed input and
//! image uploads are debounced into shareable URLs, URLs drive at most one
//! in-flight catalog request, and the newest result is turned into a view
//! model. Everything else (cart, checkout, rendering) talks to this crate
//! through [`domains::search::SearchSession`].

pub mod domains;
pub mod infra;

pub use domains::search::{
    Message, ResultsView, SearchCoordinator, SearchKey, SearchSession,
    SessionDeps,
};
pub use infra::api_client::ApiClient;
pub use infra::services::api::CatalogApi;
