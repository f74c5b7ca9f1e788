//! Request bookkeeping shared by the coordinator and the autocomplete client.

use storefront_model::{SearchQuery, SearchResponse};
use tokio_util::sync::CancellationToken;

use super::error::SearchError;

/// Monotonic id of an issued request. Only the newest ticket of a slot may
/// change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestTicket(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestPhase {
    #[default]
    Idle,
    Pending,
    Committed,
    Cancelled,
}

/// What a request future resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Loaded(T),
    /// Superseded or disposed; never reported to the user.
    Cancelled,
    Failed(SearchError),
    /// The image id in the URL is not in this session's cache.
    ImageMissing,
}

#[derive(Debug)]
struct InFlight<P> {
    ticket: RequestTicket,
    token: CancellationToken,
    payload: P,
}

/// Holds at most one in-flight request. Starting a new one cancels the
/// previous token.
#[derive(Debug)]
pub struct RequestSlot<P> {
    issued: u64,
    active: Option<InFlight<P>>,
    phase: RequestPhase,
}

impl<P> Default for RequestSlot<P> {
    fn default() -> Self {
        Self {
            issued: 0,
            active: None,
            phase: RequestPhase::Idle,
        }
    }
}

impl<P> RequestSlot<P> {
    pub fn begin(&mut self, payload: P) -> (RequestTicket, CancellationToken) {
        self.cancel();
        self.issued += 1;
        let ticket = RequestTicket(self.issued);
        let token = CancellationToken::new();
        self.active = Some(InFlight {
            ticket,
            token: token.clone(),
            payload,
        });
        self.phase = RequestPhase::Pending;
        (ticket, token)
    }

    pub fn cancel(&mut self) -> Option<RequestTicket> {
        let active = self.active.take()?;
        active.token.cancel();
        self.phase = RequestPhase::Cancelled;
        Some(active.ticket)
    }

    /// Close the slot if `ticket` is the live request, handing back its
    /// payload. Stale or cancelled tickets get `None`.
    pub fn settle(&mut self, ticket: RequestTicket) -> Option<P> {
        match &self.active {
            Some(active)
                if active.ticket == ticket && !active.token.is_cancelled() => {}
            _ => return None,
        }
        self.phase = RequestPhase::Committed;
        self.active.take().map(|active| active.payload)
    }

    pub fn current(&self) -> Option<RequestTicket> {
        self.active.as_ref().map(|active| active.ticket)
    }

    pub fn is_pending(&self) -> bool {
        self.active.is_some()
    }

    pub fn phase(&self) -> RequestPhase {
        self.phase
    }
}

/// What the presenter is allowed to see.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SearchStatus {
    #[default]
    Idle,
    Loading { query: SearchQuery },
    Ready {
        query: SearchQuery,
        response: SearchResponse,
    },
    ReuploadRequired { query: SearchQuery },
}

impl SearchStatus {
    pub fn query(&self) -> Option<&SearchQuery> {
        match self {
            Self::Idle => None,
            Self::Loading { query }
            | Self::Ready { query, .. }
            | Self::ReuploadRequired { query } => Some(query),
        }
    }

    pub fn response(&self) -> Option<&SearchResponse> {
        match self {
            Self::Ready { response, .. } => Some(response),
            _ => None,
        }
    }
}
