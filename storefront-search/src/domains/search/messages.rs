//! Search domain messages

use storefront_model::{Category, CategoryScope, SearchResponse};
use url::Url;

use super::debounce::DebounceTicket;
use super::error::{ImageCacheError, SearchError};
use super::image_cache::SearchImage;
use super::types::{FetchOutcome, RequestTicket};

/// Keys the search box reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKey {
    ArrowUp,
    ArrowDown,
    Enter,
    Escape,
}

#[derive(Clone, Debug)]
pub enum Message {
    // User actions
    /// Search box edited
    InputChanged(String),
    CategorySelected(CategoryScope),
    PageSelected(u32),
    KeyPressed(SearchKey),
    /// Suggestion clicked, by index into the visible list
    SuggestionChosen(usize),
    /// Raw bytes of an image picked for visual search
    ImageSelected(Vec<u8>),
    ImageCleared,

    // Navigation
    /// The address bar changed underneath us (back/forward, shared link)
    LocationChanged(Url),

    // Internal events
    CommitDebounced {
        ticket: DebounceTicket,
        text: String,
    },
    SuggestDebounced {
        ticket: DebounceTicket,
        text: String,
    },
    HomeRedirectDue(DebounceTicket),
    SearchFinished {
        ticket: RequestTicket,
        outcome: FetchOutcome<SearchResponse>,
    },
    SuggestionsFinished {
        ticket: RequestTicket,
        outcome: FetchOutcome<Vec<String>>,
    },
    ImageStored(Result<SearchImage, ImageCacheError>),
    CategoriesLoaded(Result<Vec<Category>, SearchError>),
}

impl Message {
    /// Convert to string for debugging
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InputChanged(_) => "InputChanged",
            Self::CategorySelected(_) => "CategorySelected",
            Self::PageSelected(_) => "PageSelected",
            Self::KeyPressed(_) => "KeyPressed",
            Self::SuggestionChosen(_) => "SuggestionChosen",
            Self::ImageSelected(_) => "ImageSelected",
            Self::ImageCleared => "ImageCleared",
            Self::LocationChanged(_) => "LocationChanged",
            Self::CommitDebounced { .. } => "CommitDebounced",
            Self::SuggestDebounced { .. } => "SuggestDebounced",
            Self::HomeRedirectDue(_) => "HomeRedirectDue",
            Self::SearchFinished { .. } => "SearchFinished",
            Self::SuggestionsFinished { .. } => "SuggestionsFinished",
            Self::ImageStored(_) => "ImageStored",
            Self::CategoriesLoaded(_) => "CategoriesLoaded",
        }
    }
}
