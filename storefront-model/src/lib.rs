//! Core data model definitions shared across storefront crates.
#![allow(missing_docs)]

pub mod category;
pub mod error;
pub mod ids;
pub mod location;
pub mod product;
pub mod query;
pub mod response;

// Intentionally curated re-exports for downstream consumers.
pub use category::Category;
pub use error::{ModelError, Result as ModelResult};
pub use ids::{CategoryId, CategoryScope, ImageId, ProductId};
pub use location::{Route, SearchLocation};
pub use product::Product;
pub use query::{SearchMode, SearchQuery};
pub use response::{
    AutocompletePayload, RawSearchPayload, SearchResponse, page_count_for,
};
