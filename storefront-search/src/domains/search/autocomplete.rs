use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use storefront_model::CategoryScope;
use tracing::{debug, warn};

use super::coordinator::guarded;
use super::types::{FetchOutcome, RequestSlot, RequestTicket};
use crate::infra::services::api::{AutocompleteRequest, CatalogApi};

#[derive(Debug, Clone)]
pub struct AutocompleteSettings {
    pub limit: usize,
    pub request_timeout: Duration,
    pub store_id: Option<String>,
}

/// Suggestions shown under the search box plus the keyboard highlight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionList {
    items: Vec<String>,
    highlighted: Option<usize>,
    open: bool,
}

impl SuggestionList {
    pub fn set_items(&mut self, items: Vec<String>) {
        self.open = !items.is_empty();
        self.items = items;
        self.highlighted = None;
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn highlighted_item(&self) -> Option<&str> {
        if !self.open {
            return None;
        }
        self.highlighted
            .and_then(|index| self.items.get(index))
            .map(String::as_str)
    }

    /// ArrowDown. Stops at the last entry.
    pub fn highlight_next(&mut self) {
        if !self.open || self.items.is_empty() {
            return;
        }
        let last = self.items.len() - 1;
        self.highlighted = Some(match self.highlighted {
            None => 0,
            Some(i) => (i + 1).min(last),
        });
    }

    /// ArrowUp. Stops at the first entry.
    pub fn highlight_previous(&mut self) {
        if !self.open || self.items.is_empty() {
            return;
        }
        self.highlighted = Some(match self.highlighted {
            None | Some(0) => 0,
            Some(i) => i - 1,
        });
    }

    pub fn close(&mut self) {
        self.open = false;
        self.highlighted = None;
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.close();
    }
}

/// A suggestion fetch ready to be spawned.
pub struct PendingSuggestions {
    ticket: RequestTicket,
    future: BoxFuture<'static, FetchOutcome<Vec<String>>>,
}

impl std::fmt::Debug for PendingSuggestions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingSuggestions")
            .field("ticket", &self.ticket)
            .finish()
    }
}

impl PendingSuggestions {
    pub fn ticket(&self) -> RequestTicket {
        self.ticket
    }

    pub async fn run(self) -> (RequestTicket, FetchOutcome<Vec<String>>) {
        (self.ticket, self.future.await)
    }
}

/// Fetches suggestions for the text being typed. The newest request wins;
/// failures just empty the list.
#[derive(Debug)]
pub struct AutocompleteClient {
    api: Arc<dyn CatalogApi>,
    settings: AutocompleteSettings,
    slot: RequestSlot<String>,
    list: SuggestionList,
}

impl AutocompleteClient {
    pub fn new(api: Arc<dyn CatalogApi>, settings: AutocompleteSettings) -> Self {
        Self {
            api,
            settings,
            slot: RequestSlot::default(),
            list: SuggestionList::default(),
        }
    }

    /// Start a fetch for `text`. Blank text cancels any fetch, clears the
    /// list and returns `None`.
    pub fn request(
        &mut self,
        text: &str,
        category: &CategoryScope,
        store_id: Option<&str>,
    ) -> Option<PendingSuggestions> {
        let query = text.trim();
        if query.is_empty() {
            self.cancel();
            self.list.clear();
            return None;
        }

        let (ticket, token) = self.slot.begin(query.to_string());
        let request = AutocompleteRequest {
            query: query.to_string(),
            store_id: store_id
                .map(str::to_string)
                .or_else(|| self.settings.store_id.clone()),
            category: category.clone(),
            limit: self.settings.limit,
        };
        let api = Arc::clone(&self.api);
        let limit = self.settings.limit;
        let timeout = self.settings.request_timeout;

        debug!("[Autocomplete] {:?} for {:?}", ticket, request.query);
        let future = guarded(token, timeout, async move {
            api.autocomplete(&request)
                .await
                .map(|payload| payload.into_suggestions(limit))
        });

        Some(PendingSuggestions {
            ticket,
            future: Box::pin(future),
        })
    }

    /// Apply a finished fetch. Returns true when the list changed.
    pub fn complete(
        &mut self,
        ticket: RequestTicket,
        outcome: FetchOutcome<Vec<String>>,
    ) -> bool {
        if matches!(outcome, FetchOutcome::Cancelled) {
            return false;
        }
        let Some(query) = self.slot.settle(ticket) else {
            debug!("[Autocomplete] Dropping stale {:?}", ticket);
            return false;
        };

        match outcome {
            FetchOutcome::Loaded(items) => {
                debug!("[Autocomplete] {} suggestions for {:?}", items.len(), query);
                self.list.set_items(items);
            }
            FetchOutcome::Failed(err) => {
                warn!("[Autocomplete] Suggestions for {:?} failed: {}", query, err);
                self.list.clear();
            }
            FetchOutcome::Cancelled | FetchOutcome::ImageMissing => {}
        }
        true
    }

    pub fn cancel(&mut self) {
        self.slot.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.slot.is_pending()
    }

    pub fn list(&self) -> &SuggestionList {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut SuggestionList {
        &mut self.list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> SuggestionList {
        let mut list = SuggestionList::default();
        list.set_items(items.iter().map(|s| s.to_string()).collect());
        list
    }

    #[test]
    fn highlight_is_clamped_without_wraparound() {
        let mut list = list(&["box", "boxes", "boxer"]);
        assert_eq!(list.highlighted(), None);

        list.highlight_next();
        assert_eq!(list.highlighted_item(), Some("box"));
        list.highlight_previous();
        assert_eq!(list.highlighted(), Some(0));

        list.highlight_next();
        list.highlight_next();
        list.highlight_next();
        assert_eq!(list.highlighted_item(), Some("boxer"));
    }

    #[test]
    fn closed_or_empty_lists_ignore_arrows() {
        let mut empty = SuggestionList::default();
        empty.highlight_next();
        assert_eq!(empty.highlighted(), None);
        assert!(!empty.is_open());

        let mut closed = list(&["box"]);
        closed.close();
        closed.highlight_next();
        assert_eq!(closed.highlighted_item(), None);
    }

    #[test]
    fn new_items_reset_the_highlight() {
        let mut list = list(&["box", "boxes"]);
        list.highlight_next();
        list.set_items(vec!["bag".into()]);
        assert_eq!(list.highlighted(), None);
        assert!(list.is_open());

        list.set_items(Vec::new());
        assert!(!list.is_open());
    }
}
