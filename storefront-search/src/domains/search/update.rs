//! Search domain update logic

use std::sync::Arc;

use storefront_model::SearchLocation;
use tracing::{debug, info, warn};
use url::Url;

use super::coordinator::{PendingSearch, SearchUpdate};
use super::error::SearchError;
use super::messages::{Message, SearchKey};
use super::session::SearchSession;
use super::synchronizer::{CategoryMove, TextIntent};
use crate::infra::notifications::NoticeLevel;

impl SearchSession {
    pub(super) fn update(&mut self, message: Message) {
        debug!("[SearchSession] {}", message.as_str());

        match message {
            Message::InputChanged(text) => self.handle_input(text),

            Message::CategorySelected(category) => {
                self.sync.set_category(category);
                match self.sync.category_move() {
                    CategoryMove::Navigate(location) => {
                        self.commit.cancel();
                        self.navigate(location);
                    }
                    CategoryMove::GoHome => self.go_home(),
                    CategoryMove::Stay => {
                        debug!("[SearchSession] Category kept for the next commit")
                    }
                }
            }

            Message::PageSelected(page) => match self.sync.page_target(page) {
                Ok(Some(location)) => self.navigate(location),
                Ok(None) => {}
                Err(err) => warn!("[SearchSession] Ignoring page {}: {}", page, err),
            },

            Message::KeyPressed(key) => self.handle_key(key),

            Message::SuggestionChosen(index) => {
                let chosen = self.autocomplete.list().items().get(index).cloned();
                if let Some(suggestion) = chosen {
                    self.choose_suggestion(suggestion);
                }
            }

            Message::ImageSelected(bytes) => {
                let images = Arc::clone(&self.images);
                let tx = self.tx.clone();
                self.background += 1;
                tokio::spawn(async move {
                    let stored = images.store(&bytes).await;
                    let _ = tx.send(Message::ImageStored(stored));
                });
            }

            Message::ImageStored(stored) => {
                self.background = self.background.saturating_sub(1);
                match stored {
                    Ok(image) => {
                        self.cancel_timers();
                        self.autocomplete.cancel();
                        self.autocomplete.list_mut().clear();
                        self.sync.set_text("");
                        let location = self.sync.image_target(image.id);
                        self.navigate(location);
                    }
                    Err(err) => {
                        warn!("[SearchSession] Image rejected: {}", err);
                        self.notifier.notify(NoticeLevel::Warning, err.to_string());
                    }
                }
            }

            Message::ImageCleared => {
                if let Some(image_id) = self.images.current() {
                    let images = Arc::clone(&self.images);
                    tokio::spawn(async move { images.evict(&image_id).await });
                }
                let location = self.sync.location();
                if location.is_search() && location.query.is_image() {
                    self.go_home();
                }
            }

            Message::LocationChanged(url) => self.on_location(url),

            Message::CommitDebounced { ticket, text } => {
                // The input may have moved on since the timer was set.
                if self.commit.fire(ticket) && self.sync.input().text == text {
                    if let Some(location) = self.sync.commit_target() {
                        self.navigate(location);
                    }
                }
            }

            Message::SuggestDebounced { ticket, text } => {
                if self.suggest.fire(ticket) && self.sync.input().text == text {
                    let category = self.sync.input().category.clone();
                    let store_id = self.sync.store_id().map(str::to_string);
                    if let Some(pending) =
                        self.autocomplete
                            .request(&text, &category, store_id.as_deref())
                    {
                        let tx = self.tx.clone();
                        tokio::spawn(async move {
                            let (ticket, outcome) = pending.run().await;
                            let _ = tx.send(Message::SuggestionsFinished { ticket, outcome });
                        });
                    }
                }
            }

            Message::HomeRedirectDue(ticket) => {
                if self.home.fire(ticket)
                    && self.sync.input().text.trim().is_empty()
                    && self.sync.location().is_search()
                {
                    self.go_home();
                }
            }

            Message::SearchFinished { ticket, outcome } => {
                match self.coordinator.complete(ticket, outcome) {
                    SearchUpdate::Applied | SearchUpdate::ReuploadRequired => {}
                    SearchUpdate::Stale | SearchUpdate::Cancelled => {
                        debug!("[SearchSession] {:?} dropped", ticket)
                    }
                    SearchUpdate::Failed(err) => {
                        debug!("[SearchSession] {:?} failed: {}", ticket, err)
                    }
                }
            }

            Message::SuggestionsFinished { ticket, outcome } => {
                self.autocomplete.complete(ticket, outcome);
            }

            Message::CategoriesLoaded(loaded) => {
                self.background = self.background.saturating_sub(1);
                match loaded {
                    Ok(categories) => {
                        debug!("[SearchSession] {} categories", categories.len());
                        self.categories = categories;
                    }
                    Err(err) => warn!("[SearchSession] Could not load categories: {}", err),
                }
            }
        }
    }

    fn handle_input(&mut self, text: String) {
        self.sync.set_text(text.clone());
        self.home.cancel();

        match self.sync.text_intent() {
            TextIntent::Commit => {
                let scheduled = text.clone();
                self.commit.schedule(&self.tx, |ticket| Message::CommitDebounced {
                    ticket,
                    text: scheduled,
                });
            }
            TextIntent::GoHome => {
                self.commit.cancel();
                self.home.schedule(&self.tx, Message::HomeRedirectDue);
            }
            TextIntent::Hold => {
                self.commit.cancel();
            }
        }

        if text.trim().is_empty() {
            self.suggest.cancel();
            self.autocomplete.cancel();
            self.autocomplete.list_mut().clear();
        } else {
            self.suggest.schedule(&self.tx, |ticket| Message::SuggestDebounced {
                ticket,
                text,
            });
        }
    }

    fn handle_key(&mut self, key: SearchKey) {
        match key {
            SearchKey::ArrowDown => self.autocomplete.list_mut().highlight_next(),
            SearchKey::ArrowUp => self.autocomplete.list_mut().highlight_previous(),
            SearchKey::Enter => {
                let highlighted = self
                    .autocomplete
                    .list()
                    .highlighted_item()
                    .map(str::to_string);
                if let Some(suggestion) = highlighted {
                    self.choose_suggestion(suggestion);
                } else if self.sync.input_meets_minimum() {
                    self.commit_now();
                } else if self.sync.input().text.trim().is_empty() {
                    self.go_home();
                }
            }
            SearchKey::Escape => {
                self.autocomplete.list_mut().close();
                if self.sync.input().text.trim().is_empty() {
                    self.go_home();
                }
            }
        }
    }

    fn choose_suggestion(&mut self, suggestion: String) {
        info!("[SearchSession] Suggestion chosen: {:?}", suggestion);
        self.sync.set_text(suggestion);
        self.commit_now();
    }

    /// Commit the input right away, skipping the debounce.
    fn commit_now(&mut self) {
        self.cancel_timers();
        self.autocomplete.cancel();
        self.autocomplete.list_mut().close();
        if let Some(location) = self.sync.commit_target() {
            self.navigate(location);
        }
    }

    fn go_home(&mut self) {
        self.cancel_timers();
        self.coordinator.reset();
        self.autocomplete.cancel();
        self.autocomplete.list_mut().clear();
        self.navigate(SearchLocation::home());
    }

    fn cancel_timers(&mut self) {
        self.commit.cancel();
        self.suggest.cancel();
        self.home.cancel();
    }

    pub(super) fn navigate(&mut self, location: SearchLocation) {
        if location == *self.sync.location() {
            debug!("[SearchSession] Already at {:?}", location.route);
            return;
        }
        match self.sync.url_for(&location) {
            Ok(url) => {
                info!("[SearchSession] Navigating to {}", url);
                self.navigator.push(url.clone());
                self.on_location(url);
            }
            Err(err) => warn!("[SearchSession] Cannot build URL: {}", err),
        }
    }

    /// Bring input and results in line with `url`. Never schedules a
    /// debounce: the URL already is the committed state.
    fn on_location(&mut self, url: Url) {
        let synced = self.sync.apply_location(&url);
        self.home.cancel();
        if synced.input_changed {
            self.commit.cancel();
            self.suggest.cancel();
            self.autocomplete.cancel();
            self.autocomplete.list_mut().clear();
        }

        if synced.location.is_search() {
            self.start_search(&synced.location);
        } else {
            self.coordinator.reset();
        }
    }

    fn start_search(&mut self, location: &SearchLocation) {
        let query = &location.query;
        let store_id = location.store_id.as_deref();
        let pending = if query.is_image() {
            self.coordinator.search_by_image(query, store_id)
        } else {
            self.coordinator.search_by_text(query, store_id)
        };
        match pending {
            Ok(pending) => self.spawn_search(pending),
            Err(rejected) => {
                debug!("[SearchSession] Not searching: {}", rejected);
                self.coordinator.reset();
            }
        }
    }

    fn spawn_search(&self, pending: PendingSearch) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let (ticket, outcome) = pending.run().await;
            let _ = tx.send(Message::SearchFinished { ticket, outcome });
        });
    }

    pub(super) fn load_categories(&mut self) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let timeout = self.request_timeout;
        self.background += 1;
        tokio::spawn(async move {
            let loaded = match tokio::time::timeout(timeout, api.categories()).await {
                Ok(loaded) => loaded,
                Err(_) => Err(SearchError::Timeout { after: timeout }),
            };
            let _ = tx.send(Message::CategoriesLoaded(loaded));
        });
    }
}
