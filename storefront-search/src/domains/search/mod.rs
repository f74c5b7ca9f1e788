//! Search domain - text and image product search for the storefront

pub mod autocomplete;
pub mod coordinator;
pub mod debounce;
pub mod error;
pub mod image_cache;
pub mod messages;
pub mod presenter;
pub mod session;
pub mod synchronizer;
pub mod types;
pub mod update;

pub use self::autocomplete::{AutocompleteClient, SuggestionList};
pub use self::coordinator::{SearchCoordinator, SearchUpdate};
pub use self::error::{ImageCacheError, SearchError};
pub use self::image_cache::{SearchImage, SessionImageCache};
pub use self::messages::{Message, SearchKey};
pub use self::presenter::{Pagination, ProductCard, ResultsPresenter, ResultsView};
pub use self::session::{SearchSession, SessionDeps};
pub use self::synchronizer::{CategoryMove, InputState, QuerySynchronizer};
pub use self::types::{FetchOutcome, RequestTicket, SearchStatus};
