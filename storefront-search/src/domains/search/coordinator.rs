//! Search request coordinator.
//!
//! Owns the single in-flight search. Every new search cancels the one before
//! it, and only the newest ticket may change [`SearchStatus`], so a slow
//! response for an old query can never overwrite a newer result set.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use storefront_model::{SearchQuery, SearchResponse};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::{SearchError, SearchResult};
use super::image_cache::SessionImageCache;
use super::types::{FetchOutcome, RequestSlot, RequestTicket, SearchStatus};
use crate::infra::notifications::{NoticeLevel, Notifier};
use crate::infra::services::api::{
    CatalogApi, ImageSearchRequest, ImageUpload, TextSearchRequest,
};

#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub page_size: u32,
    pub min_query_chars: usize,
    pub request_timeout: Duration,
    pub store_id: Option<String>,
}

/// Why a query was not sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryRejected {
    #[error("Query needs at least {min_chars} characters")]
    TooShort { min_chars: usize },
    #[error("Expected a text query")]
    NotText,
    #[error("Expected an image query")]
    NotImage,
}

/// Result of feeding a finished request back into the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchUpdate {
    Applied,
    Stale,
    Cancelled,
    Failed(SearchError),
    ReuploadRequired,
}

/// A search request ready to be spawned. Dropping it abandons the request.
pub struct PendingSearch {
    ticket: RequestTicket,
    future: BoxFuture<'static, FetchOutcome<SearchResponse>>,
}

impl std::fmt::Debug for PendingSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingSearch")
            .field("ticket", &self.ticket)
            .finish()
    }
}

impl PendingSearch {
    pub fn ticket(&self) -> RequestTicket {
        self.ticket
    }

    pub async fn run(self) -> (RequestTicket, FetchOutcome<SearchResponse>) {
        (self.ticket, self.future.await)
    }
}

/// Resolve `fetch` unless `token` is cancelled first.
pub(crate) async fn cancellable<T, F>(
    token: CancellationToken,
    fetch: F,
) -> FetchOutcome<T>
where
    F: Future<Output = FetchOutcome<T>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => FetchOutcome::Cancelled,
        outcome = fetch => outcome,
    }
}

/// Bound a catalog call by `timeout`.
pub(crate) async fn bounded<T, F>(timeout: Duration, request: F) -> FetchOutcome<T>
where
    F: Future<Output = SearchResult<T>>,
{
    match tokio::time::timeout(timeout, request).await {
        Ok(Ok(value)) => FetchOutcome::Loaded(value),
        Ok(Err(err)) => FetchOutcome::Failed(err),
        Err(_) => FetchOutcome::Failed(SearchError::Timeout { after: timeout }),
    }
}

pub(crate) async fn guarded<T, F>(
    token: CancellationToken,
    timeout: Duration,
    request: F,
) -> FetchOutcome<T>
where
    F: Future<Output = SearchResult<T>>,
{
    cancellable(token, bounded(timeout, request)).await
}

#[derive(Debug)]
pub struct SearchCoordinator {
    api: Arc<dyn CatalogApi>,
    images: Arc<SessionImageCache>,
    notifier: Arc<dyn Notifier>,
    settings: CoordinatorSettings,
    slot: RequestSlot<SearchQuery>,
    status: SearchStatus,
}

impl SearchCoordinator {
    pub fn new(
        api: Arc<dyn CatalogApi>,
        images: Arc<SessionImageCache>,
        notifier: Arc<dyn Notifier>,
        settings: CoordinatorSettings,
    ) -> Self {
        Self {
            api,
            images,
            notifier,
            settings,
            slot: RequestSlot::default(),
            status: SearchStatus::Idle,
        }
    }

    /// Search by text in `store_id`, or the configured store when the
    /// location named none.
    pub fn search_by_text(
        &mut self,
        query: &SearchQuery,
        store_id: Option<&str>,
    ) -> Result<PendingSearch, QueryRejected> {
        if query.is_image() {
            return Err(QueryRejected::NotText);
        }
        if !query.meets_minimum(self.settings.min_query_chars) {
            return Err(QueryRejected::TooShort {
                min_chars: self.settings.min_query_chars,
            });
        }

        let (ticket, token) = self.begin(query);
        let request = TextSearchRequest {
            query: query.trimmed_text().to_string(),
            store_id: self.store_for(store_id),
            category: query.category.clone(),
            page: query.page,
            limit: self.settings.page_size,
        };
        let api = Arc::clone(&self.api);
        let (page, limit) = (query.page, self.settings.page_size);

        let future = guarded(token, self.settings.request_timeout, async move {
            api.search_products(&request)
                .await
                .map(|raw| SearchResponse::from_payload(raw, page, limit))
        });

        Ok(PendingSearch {
            ticket,
            future: Box::pin(future),
        })
    }

    /// Search with the cached image named by `query.image_id`. A cache miss
    /// resolves to [`FetchOutcome::ImageMissing`].
    pub fn search_by_image(
        &mut self,
        query: &SearchQuery,
        store_id: Option<&str>,
    ) -> Result<PendingSearch, QueryRejected> {
        if !query.is_image() {
            return Err(QueryRejected::NotImage);
        }

        let (ticket, token) = self.begin(query);
        let api = Arc::clone(&self.api);
        let images = Arc::clone(&self.images);
        let image_id = query.image_id.clone();
        let category = query.category.clone();
        let store_id = self.store_for(store_id);
        let (page, limit) = (query.page, self.settings.page_size);
        let timeout = self.settings.request_timeout;

        let fetch = async move {
            let Some(image_id) = image_id else {
                return FetchOutcome::ImageMissing;
            };
            let Some(data_url) = images.retrieve(&image_id).await else {
                debug!("[SearchCoordinator] Image {} not in this session", image_id);
                return FetchOutcome::ImageMissing;
            };
            let image = match ImageUpload::from_data_url(&data_url) {
                Ok(image) => image,
                Err(err) => {
                    warn!("[SearchCoordinator] Cached image {} unusable: {}", image_id, err);
                    return FetchOutcome::ImageMissing;
                }
            };
            let request = ImageSearchRequest {
                image,
                store_id,
                category,
                page,
                limit,
            };
            bounded(timeout, async move {
                api.search_by_image(&request)
                    .await
                    .map(|raw| SearchResponse::from_payload(raw, page, limit))
            })
            .await
        };

        Ok(PendingSearch {
            ticket,
            future: Box::pin(cancellable(token, fetch)),
        })
    }

    fn store_for(&self, store_id: Option<&str>) -> Option<String> {
        store_id
            .map(str::to_string)
            .or_else(|| self.settings.store_id.clone())
    }

    fn begin(&mut self, query: &SearchQuery) -> (RequestTicket, CancellationToken) {
        let (ticket, token) = self.slot.begin(query.clone());
        debug!("[SearchCoordinator] Issued {:?} for {:?}", ticket, query);
        self.status = SearchStatus::Loading {
            query: query.clone(),
        };
        (ticket, token)
    }

    /// Apply a finished request. Only the live ticket can change state.
    pub fn complete(
        &mut self,
        ticket: RequestTicket,
        outcome: FetchOutcome<SearchResponse>,
    ) -> SearchUpdate {
        if matches!(outcome, FetchOutcome::Cancelled) {
            return SearchUpdate::Cancelled;
        }
        let Some(query) = self.slot.settle(ticket) else {
            debug!("[SearchCoordinator] Discarding stale {:?}", ticket);
            return SearchUpdate::Stale;
        };

        match outcome {
            FetchOutcome::Loaded(response) => {
                info!(
                    "[SearchCoordinator] {} results (page {}/{}) for {:?}",
                    response.results.len(),
                    response.page,
                    response.page_count,
                    query.text
                );
                self.status = SearchStatus::Ready { query, response };
                SearchUpdate::Applied
            }
            FetchOutcome::Failed(err) => {
                warn!("[SearchCoordinator] Search failed: {}", err);
                self.notifier.notify(NoticeLevel::Error, err.user_message());
                self.status = SearchStatus::Ready {
                    query,
                    response: SearchResponse::empty(),
                };
                SearchUpdate::Failed(err)
            }
            FetchOutcome::ImageMissing => {
                self.status = SearchStatus::ReuploadRequired { query };
                SearchUpdate::ReuploadRequired
            }
            FetchOutcome::Cancelled => SearchUpdate::Cancelled,
        }
    }

    /// Cancel the in-flight request without touching the presented state.
    pub fn cancel(&mut self) {
        if let Some(ticket) = self.slot.cancel() {
            debug!("[SearchCoordinator] Cancelled {:?}", ticket);
        }
    }

    /// Cancel and forget everything, e.g. when leaving the search page.
    pub fn reset(&mut self) {
        self.cancel();
        self.status = SearchStatus::Idle;
    }

    pub fn status(&self) -> &SearchStatus {
        &self.status
    }

    pub fn is_pending(&self) -> bool {
        self.slot.is_pending()
    }

    pub fn current_ticket(&self) -> Option<RequestTicket> {
        self.slot.current()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;
    use storefront_model::{
        AutocompletePayload, Category, CategoryScope, RawSearchPayload,
    };

    use super::*;
    use crate::domains::search::image_cache::MemorySlot;
    use crate::infra::notifications::NoticeBoard;
    use crate::infra::services::api::AutocompleteRequest;

    #[derive(Debug, Default)]
    struct StubCatalog {
        calls: AtomicUsize,
        delay: Option<Duration>,
        total: u64,
    }

    #[async_trait]
    impl CatalogApi for StubCatalog {
        async fn search_products(
            &self,
            request: &TextSearchRequest,
        ) -> SearchResult<RawSearchPayload> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let results = (0..3)
                .map(|i| json!({"id": format!("{}-{i}", request.query), "name": "Box"}))
                .collect();
            Ok(RawSearchPayload {
                results: Some(results),
                total: Some(self.total),
                ..RawSearchPayload::default()
            })
        }

        async fn search_by_image(
            &self,
            _request: &ImageSearchRequest,
        ) -> SearchResult<RawSearchPayload> {
            Ok(RawSearchPayload::default())
        }

        async fn autocomplete(
            &self,
            _request: &AutocompleteRequest,
        ) -> SearchResult<AutocompletePayload> {
            Ok(AutocompletePayload::default())
        }

        async fn categories(&self) -> SearchResult<Vec<Category>> {
            Ok(Vec::new())
        }
    }

    fn coordinator(catalog: StubCatalog) -> (SearchCoordinator, Arc<NoticeBoard>) {
        let notices = Arc::new(NoticeBoard::new());
        let images = Arc::new(SessionImageCache::with_stores(
            Box::new(MemorySlot::new()),
            Box::new(MemorySlot::new()),
            1024,
        ));
        let coordinator = SearchCoordinator::new(
            Arc::new(catalog),
            images,
            notices.clone(),
            CoordinatorSettings {
                page_size: 24,
                min_query_chars: 2,
                request_timeout: Duration::from_secs(10),
                store_id: Some("store-1".into()),
            },
        );
        (coordinator, notices)
    }

    fn loaded(ids: &[&str]) -> FetchOutcome<SearchResponse> {
        let raw = RawSearchPayload {
            results: Some(ids.iter().map(|id| json!({"id": id})).collect()),
            total: Some(ids.len() as u64),
            ..RawSearchPayload::default()
        };
        FetchOutcome::Loaded(SearchResponse::from_payload(raw, 1, 24))
    }

    #[test]
    fn short_text_is_rejected_unless_scoped() {
        let (mut coordinator, _) = coordinator(StubCatalog::default());
        let short = SearchQuery::text("b", CategoryScope::All);
        assert_eq!(
            coordinator.search_by_text(&short, None).err(),
            Some(QueryRejected::TooShort { min_chars: 2 })
        );
        assert_eq!(coordinator.status(), &SearchStatus::Idle);

        let scoped = SearchQuery::text("", CategoryScope::from_param(Some("fonts")));
        assert!(coordinator.search_by_text(&scoped, None).is_ok());
        assert!(matches!(coordinator.status(), SearchStatus::Loading { .. }));
    }

    #[tokio::test]
    async fn stale_results_are_discarded_even_with_data() {
        let (mut coordinator, _) = coordinator(StubCatalog::default());
        let old = coordinator
            .search_by_text(&SearchQuery::text("box", CategoryScope::All), None)
            .unwrap();
        let new = coordinator
            .search_by_text(&SearchQuery::text("boxes", CategoryScope::All), None)
            .unwrap();

        assert_eq!(coordinator.complete(new.ticket(), loaded(&["b1"])), SearchUpdate::Applied);
        assert_eq!(coordinator.complete(old.ticket(), loaded(&["a1", "a2"])), SearchUpdate::Stale);

        let response = coordinator.status().response().unwrap();
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].id.as_str(), "b1");
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_request_resolves_as_cancelled() {
        let catalog = StubCatalog {
            delay: Some(Duration::from_secs(2)),
            total: 3,
            ..StubCatalog::default()
        };
        let (mut coordinator, notices) = coordinator(catalog);
        let first = coordinator
            .search_by_text(&SearchQuery::text("box", CategoryScope::All), None)
            .unwrap();
        let second = coordinator
            .search_by_text(&SearchQuery::text("boxes", CategoryScope::All), None)
            .unwrap();

        let (ticket, outcome) = first.run().await;
        assert_eq!(outcome, FetchOutcome::Cancelled);
        assert_eq!(coordinator.complete(ticket, outcome), SearchUpdate::Cancelled);
        assert!(matches!(coordinator.status(), SearchStatus::Loading { .. }));

        let (ticket, outcome) = second.run().await;
        assert_eq!(coordinator.complete(ticket, outcome), SearchUpdate::Applied);
        assert!(notices.active().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_clears_results_and_notifies_once() {
        let catalog = StubCatalog {
            delay: Some(Duration::from_secs(11)),
            ..StubCatalog::default()
        };
        let (mut coordinator, notices) = coordinator(catalog);
        let pending = coordinator
            .search_by_text(&SearchQuery::text("boxes", CategoryScope::All), None)
            .unwrap();

        let (ticket, outcome) = pending.run().await;
        assert_eq!(
            outcome,
            FetchOutcome::Failed(SearchError::Timeout {
                after: Duration::from_secs(10)
            })
        );
        assert!(matches!(coordinator.complete(ticket, outcome), SearchUpdate::Failed(_)));

        assert_eq!(coordinator.status().response(), Some(&SearchResponse::empty()));
        assert_eq!(notices.active().len(), 1);
    }

    #[tokio::test]
    async fn identical_queries_give_identical_results() {
        let catalog = StubCatalog {
            total: 57,
            ..StubCatalog::default()
        };
        let (mut coordinator, _) = coordinator(catalog);
        let query = SearchQuery::text("boxes", CategoryScope::All);

        let mut responses = Vec::new();
        for _ in 0..2 {
            let (ticket, outcome) = coordinator.search_by_text(&query, None).unwrap().run().await;
            coordinator.complete(ticket, outcome);
            responses.push(coordinator.status().response().cloned().unwrap());
        }
        assert_eq!(responses[0], responses[1]);
        assert_eq!(responses[0].page_count, 3);
    }

    #[tokio::test]
    async fn unknown_image_requires_reupload() {
        let (mut coordinator, notices) = coordinator(StubCatalog::default());
        let query = SearchQuery::image(
            Some(storefront_model::ImageId::generated(1, 1)),
            CategoryScope::All,
        );
        let (ticket, outcome) = coordinator.search_by_image(&query, None).unwrap().run().await;
        assert_eq!(outcome, FetchOutcome::ImageMissing);
        assert_eq!(coordinator.complete(ticket, outcome), SearchUpdate::ReuploadRequired);
        assert!(matches!(coordinator.status(), SearchStatus::ReuploadRequired { .. }));
        assert!(notices.active().is_empty());
    }
}
