//! The search page as one message-driven state machine.
//!
//! User input, timers and finished requests all arrive as [`Message`]s.
//! Handling a message may spawn work (a debounce timer, a catalog request,
//! an image write); that work reports back by posting another message on
//! the session's channel. Nothing outside `update` mutates state.

use std::sync::Arc;
use std::time::Duration;

use storefront_config::Config;
use storefront_model::{Category, SearchLocation};
use tokio::sync::mpsc;
use tracing::debug;

use super::autocomplete::{AutocompleteClient, AutocompleteSettings, SuggestionList};
use super::coordinator::{CoordinatorSettings, SearchCoordinator};
use super::debounce::Debouncer;
use super::image_cache::SessionImageCache;
use super::messages::Message;
use super::presenter::{ResultsPresenter, ResultsView};
use super::synchronizer::{InputState, QuerySynchronizer};
use super::types::SearchStatus;
use crate::infra::navigation::Navigator;
use crate::infra::notifications::Notifier;
use crate::infra::services::api::CatalogApi;

/// Collaborators a session is mounted with.
#[derive(Debug, Clone)]
pub struct SessionDeps {
    pub api: Arc<dyn CatalogApi>,
    pub navigator: Arc<dyn Navigator>,
    pub notifier: Arc<dyn Notifier>,
    pub images: Arc<SessionImageCache>,
}

#[derive(Debug)]
pub struct SearchSession {
    pub(super) api: Arc<dyn CatalogApi>,
    pub(super) navigator: Arc<dyn Navigator>,
    pub(super) notifier: Arc<dyn Notifier>,
    pub(super) images: Arc<SessionImageCache>,
    pub(super) sync: QuerySynchronizer,
    pub(super) coordinator: SearchCoordinator,
    pub(super) autocomplete: AutocompleteClient,
    pub(super) categories: Vec<Category>,
    pub(super) commit: Debouncer,
    pub(super) suggest: Debouncer,
    pub(super) home: Debouncer,
    pub(super) request_timeout: Duration,
    /// Image writes and category loads still running.
    pub(super) background: usize,
    pub(super) tx: mpsc::UnboundedSender<Message>,
    rx: mpsc::UnboundedReceiver<Message>,
    disposed: bool,
}

impl SearchSession {
    /// Build a session, start loading categories and adopt the navigator's
    /// current URL. Must be called inside a Tokio runtime.
    pub fn mount(deps: SessionDeps, config: &Config) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let search = &config.search;
        let store_id = config.api.store_id.clone();

        let coordinator = SearchCoordinator::new(
            Arc::clone(&deps.api),
            Arc::clone(&deps.images),
            Arc::clone(&deps.notifier),
            CoordinatorSettings {
                page_size: search.page_size,
                min_query_chars: search.min_query_chars,
                request_timeout: search.request_timeout,
                store_id: store_id.clone(),
            },
        );
        let autocomplete = AutocompleteClient::new(
            Arc::clone(&deps.api),
            AutocompleteSettings {
                limit: search.suggestion_limit,
                request_timeout: search.request_timeout,
                store_id: store_id.clone(),
            },
        );

        let mut session = Self {
            api: deps.api,
            navigator: deps.navigator,
            notifier: deps.notifier,
            images: deps.images,
            sync: QuerySynchronizer::new(
                config.site.origin.clone(),
                store_id,
                search.min_query_chars,
            ),
            coordinator,
            autocomplete,
            categories: Vec::new(),
            commit: Debouncer::new("commit", search.commit_debounce),
            suggest: Debouncer::new("suggest", search.suggest_debounce),
            home: Debouncer::new("home", search.home_redirect_delay),
            request_timeout: search.request_timeout,
            background: 0,
            tx,
            rx,
            disposed: false,
        };

        session.load_categories();
        let location = session.navigator.location();
        session.dispatch(Message::LocationChanged(location));
        session
    }

    pub fn dispatch(&mut self, message: Message) {
        if self.disposed {
            debug!("[SearchSession] Ignoring {} after dispose", message.as_str());
            return;
        }
        self.update(message);
    }

    /// Handle every message already queued without waiting. Returns how many
    /// were handled.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.rx.try_recv() {
            self.dispatch(message);
            handled += 1;
        }
        handled
    }

    /// Handle messages as they arrive for `duration`.
    pub async fn run_for(&mut self, duration: Duration) {
        let deadline = tokio::time::Instant::now() + duration;
        loop {
            let message = tokio::select! {
                biased;
                message = self.rx.recv() => message,
                _ = tokio::time::sleep_until(deadline) => None,
            };
            match message {
                Some(message) => self.dispatch(message),
                None => break,
            }
        }
    }

    /// Handle messages until no timer, request or background task is left.
    pub async fn settle(&mut self) {
        self.process_pending();
        while !self.disposed && !self.is_settled() {
            match self.rx.recv().await {
                Some(message) => self.dispatch(message),
                None => break,
            }
        }
    }

    pub fn is_settled(&self) -> bool {
        !self.commit.is_pending()
            && !self.suggest.is_pending()
            && !self.home.is_pending()
            && !self.coordinator.is_pending()
            && !self.autocomplete.is_pending()
            && self.background == 0
    }

    /// Go to `location` as if the user had navigated there.
    pub fn navigate_to(&mut self, location: SearchLocation) {
        if !self.disposed {
            self.navigate(location);
        }
    }

    /// Cancel every timer and request. Later messages are ignored.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.commit.cancel();
        self.suggest.cancel();
        self.home.cancel();
        self.coordinator.cancel();
        self.autocomplete.cancel();
        debug!("[SearchSession] Disposed");
    }

    pub fn view(&self) -> ResultsView {
        ResultsPresenter::present(self.coordinator.status(), &self.categories)
    }

    pub fn status(&self) -> &SearchStatus {
        self.coordinator.status()
    }

    pub fn input(&self) -> &InputState {
        self.sync.input()
    }

    pub fn location(&self) -> &SearchLocation {
        self.sync.location()
    }

    pub fn suggestions(&self) -> &SuggestionList {
        self.autocomplete.list()
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn is_searching(&self) -> bool {
        self.coordinator.is_pending()
    }

    pub fn commit_pending(&self) -> bool {
        self.commit.is_pending()
    }

    pub fn home_redirect_pending(&self) -> bool {
        self.home.is_pending()
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        self.dispose();
    }
}
