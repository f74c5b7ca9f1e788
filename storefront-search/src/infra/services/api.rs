//! Catalog API service trait.
//!
//! The search domain only ever talks to the catalog through [`CatalogApi`];
//! [`crate::infra::api_client::ApiClient`] is the HTTP implementation and the
//! integration tests swap in an in-memory fake.

use std::fmt::Debug;

use async_trait::async_trait;
use storefront_model::{
    AutocompletePayload, Category, CategoryScope, RawSearchPayload,
};

use crate::domains::search::error::SearchResult;

/// `GET /products/search`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSearchRequest {
    pub query: String,
    pub store_id: Option<String>,
    pub category: CategoryScope,
    pub page: u32,
    pub limit: u32,
}

/// Raw image bytes ready for a multipart upload.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub file_name: String,
}

impl Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("bytes", &self.bytes.len())
            .field("mime", &self.mime)
            .field("file_name", &self.file_name)
            .finish()
    }
}

/// `POST /products/search-by-image`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSearchRequest {
    pub image: ImageUpload,
    pub store_id: Option<String>,
    pub category: CategoryScope,
    pub page: u32,
    pub limit: u32,
}

/// `GET /products/search/autocomplete`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutocompleteRequest {
    pub query: String,
    pub store_id: Option<String>,
    pub category: CategoryScope,
    pub limit: usize,
}

#[async_trait]
pub trait CatalogApi: Send + Sync + Debug {
    async fn search_products(
        &self,
        request: &TextSearchRequest,
    ) -> SearchResult<RawSearchPayload>;

    async fn search_by_image(
        &self,
        request: &ImageSearchRequest,
    ) -> SearchResult<RawSearchPayload>;

    async fn autocomplete(
        &self,
        request: &AutocompleteRequest,
    ) -> SearchResult<AutocompletePayload>;

    async fn categories(&self) -> SearchResult<Vec<Category>>;
}
