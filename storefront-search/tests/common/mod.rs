//! Test harness for driving a `SearchSession` against an in-memory catalog.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use storefront_config::{Config, ImageConfig};
use storefront_model::{
    AutocompletePayload, Category, CategoryId, RawSearchPayload,
};
use storefront_search::domains::search::error::{SearchError, SearchResult};
use storefront_search::domains::search::image_cache::MemorySlot;
use storefront_search::domains::search::{SearchSession, SessionDeps, SessionImageCache};
use storefront_search::infra::navigation::{MemoryHistory, Navigator};
use storefront_search::infra::notifications::NoticeBoard;
use storefront_search::infra::services::api::{
    AutocompleteRequest, CatalogApi, ImageSearchRequest, TextSearchRequest,
};
use url::Url;

pub const ORIGIN: &str = "https://shop.example.com/";
pub const STORE_ID: &str = "store-1";

pub fn url(path_and_query: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path_and_query).unwrap()
}

/// Smallest PNG header `image::guess_format` recognises.
pub fn png_bytes() -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&[0, 0, 0, 13, b'I', b'H', b'D', b'R']);
    bytes.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0, 1, 8, 6, 0, 0, 0]);
    bytes
}

#[derive(Debug, Default)]
struct CatalogState {
    text_calls: Vec<TextSearchRequest>,
    image_calls: Vec<ImageSearchRequest>,
    autocomplete_calls: Vec<AutocompleteRequest>,
    /// Queries whose request ran to the end (not dropped by cancellation).
    completed: Vec<String>,
    suggested: Vec<String>,
    delays: HashMap<String, Duration>,
    suggest_delays: HashMap<String, Duration>,
    failures: HashMap<String, SearchError>,
    totals: HashMap<String, u64>,
    image_total: u64,
    image_info: Option<String>,
}

/// Catalog that makes up `total` products per query and records every call.
#[derive(Debug, Default)]
pub struct FakeCatalog {
    state: Mutex<CatalogState>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        let catalog = Self::default();
        catalog.state.lock().image_total = 2;
        catalog
    }

    pub fn delay(&self, query: &str, delay: Duration) {
        self.state.lock().delays.insert(query.to_string(), delay);
    }

    pub fn delay_suggestions(&self, query: &str, delay: Duration) {
        self.state.lock().suggest_delays.insert(query.to_string(), delay);
    }

    pub fn fail(&self, query: &str, error: SearchError) {
        self.state.lock().failures.insert(query.to_string(), error);
    }

    pub fn total(&self, query: &str, total: u64) {
        self.state.lock().totals.insert(query.to_string(), total);
    }

    pub fn image_results(&self, total: u64, info: Option<&str>) {
        let mut state = self.state.lock();
        state.image_total = total;
        state.image_info = info.map(str::to_string);
    }

    pub fn text_queries(&self) -> Vec<String> {
        self.state
            .lock()
            .text_calls
            .iter()
            .map(|call| call.query.clone())
            .collect()
    }

    pub fn text_calls(&self) -> Vec<TextSearchRequest> {
        self.state.lock().text_calls.clone()
    }

    pub fn image_calls(&self) -> Vec<ImageSearchRequest> {
        self.state.lock().image_calls.clone()
    }

    pub fn autocomplete_calls(&self) -> Vec<AutocompleteRequest> {
        self.state.lock().autocomplete_calls.clone()
    }

    pub fn autocomplete_queries(&self) -> Vec<String> {
        self.state
            .lock()
            .autocomplete_calls
            .iter()
            .map(|call| call.query.clone())
            .collect()
    }

    pub fn completed(&self) -> Vec<String> {
        self.state.lock().completed.clone()
    }

    /// Autocomplete queries that were answered rather than cancelled.
    pub fn suggested(&self) -> Vec<String> {
        self.state.lock().suggested.clone()
    }

    fn page_of(prefix: &str, total: u64, page: u32, limit: u32) -> Vec<Value> {
        let start = u64::from(page.saturating_sub(1)) * u64::from(limit);
        let end = (start + u64::from(limit)).min(total);
        (start..end)
            .map(|i| {
                json!({
                    "id": format!("{prefix}-{i}"),
                    "name": format!("{prefix} #{i}"),
                    "slug": format!("{prefix}-{i}"),
                    "price": 9.5,
                    "currency": "USD",
                })
            })
            .collect()
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn search_products(
        &self,
        request: &TextSearchRequest,
    ) -> SearchResult<RawSearchPayload> {
        let (delay, failure, total) = {
            let mut state = self.state.lock();
            state.text_calls.push(request.clone());
            (
                state.delays.get(&request.query).copied(),
                state.failures.get(&request.query).cloned(),
                state.totals.get(&request.query).copied().unwrap_or(3),
            )
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.state.lock().completed.push(request.query.clone());
        if let Some(error) = failure {
            return Err(error);
        }

        let prefix = if request.query.is_empty() {
            request.category.to_string()
        } else {
            request.query.clone()
        };
        Ok(RawSearchPayload {
            results: Some(Self::page_of(&prefix, total, request.page, request.limit)),
            total: Some(total),
            page: Some(request.page),
            page_count: None,
            info: None,
        })
    }

    async fn search_by_image(
        &self,
        request: &ImageSearchRequest,
    ) -> SearchResult<RawSearchPayload> {
        let (total, info) = {
            let mut state = self.state.lock();
            state.image_calls.push(request.clone());
            (state.image_total, state.image_info.clone())
        };
        Ok(RawSearchPayload {
            results: Some(Self::page_of("image", total, request.page, request.limit)),
            total: Some(total),
            page: Some(request.page),
            page_count: None,
            info,
        })
    }

    async fn autocomplete(
        &self,
        request: &AutocompleteRequest,
    ) -> SearchResult<AutocompletePayload> {
        let delay = {
            let mut state = self.state.lock();
            state.autocomplete_calls.push(request.clone());
            state.suggest_delays.get(&request.query).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let query = request.query.clone();
        self.state.lock().suggested.push(query.clone());
        Ok(AutocompletePayload {
            suggestions: Some(vec![
                Some(query.clone()),
                Some(format!("{query} organizer")),
                Some(query.to_uppercase()),
                None,
                Some(format!("{query} lid")),
            ]),
        })
    }

    async fn categories(&self) -> SearchResult<Vec<Category>> {
        Ok(vec![
            Category {
                id: CategoryId::new("fonts"),
                name: "Fonts".into(),
            },
            Category {
                id: CategoryId::new("icons"),
                name: "Icons".into(),
            },
        ])
    }
}

pub fn test_config() -> Config {
    let mut config = Config::with_api(Url::parse("http://catalog.test/api").unwrap());
    config.api.store_id = Some(STORE_ID.to_string());
    config.site.origin = Url::parse(ORIGIN).unwrap();
    config
}

pub fn memory_images() -> Arc<SessionImageCache> {
    Arc::new(SessionImageCache::with_stores(
        Box::new(MemorySlot::new()),
        Box::new(MemorySlot::new()),
        1 << 20,
    ))
}

pub fn disk_images() -> Arc<SessionImageCache> {
    Arc::new(SessionImageCache::new(&ImageConfig::default()).unwrap())
}

/// Everything a mounted session talks to, kept around for assertions.
pub struct Harness {
    pub catalog: Arc<FakeCatalog>,
    pub history: Arc<MemoryHistory>,
    pub notices: Arc<NoticeBoard>,
    pub images: Arc<SessionImageCache>,
    pub config: Config,
}

impl Harness {
    pub fn new() -> Self {
        Self::at("/")
    }

    pub fn at(path_and_query: &str) -> Self {
        Self {
            catalog: Arc::new(FakeCatalog::new()),
            history: Arc::new(MemoryHistory::new(url(path_and_query))),
            notices: Arc::new(NoticeBoard::new()),
            images: memory_images(),
            config: test_config(),
        }
    }

    pub fn with_images(mut self, images: Arc<SessionImageCache>) -> Self {
        self.images = images;
        self
    }

    /// Same catalog and current URL, fresh everything else: a page reload.
    pub fn reload(&self, images: Arc<SessionImageCache>) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            history: Arc::new(MemoryHistory::new(self.history.location())),
            notices: Arc::new(NoticeBoard::new()),
            images,
            config: self.config.clone(),
        }
    }

    pub fn mount(&self) -> SearchSession {
        SearchSession::mount(
            SessionDeps {
                api: self.catalog.clone(),
                navigator: self.history.clone(),
                notifier: self.notices.clone(),
                images: self.images.clone(),
            },
            &self.config,
        )
    }

    pub fn location(&self) -> String {
        self.history.location().to_string()
    }
}
