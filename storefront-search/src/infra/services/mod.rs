//! Service traits the search domain depends on.

pub mod api;

pub use api::{
    AutocompleteRequest, CatalogApi, ImageSearchRequest, TextSearchRequest,
};
