//! Query-to-URL synchronizer.
//!
//! The URL is the source of truth for what is being searched; the input box
//! is local state that gets committed into it. This module only decides
//! *what* the next location should be. Timers and side effects live in the
//! session.

use storefront_model::query::text_meets_minimum;
use storefront_model::{
    CategoryScope, ImageId, ModelResult, Route, SearchLocation, SearchQuery,
};
use url::Url;

/// What the search box currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    pub text: String,
    pub category: CategoryScope,
}

/// How a text edit should be followed up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextIntent {
    /// Schedule a debounced commit.
    Commit,
    /// The box was emptied on the search page; go home after a delay.
    GoHome,
    /// Nothing committable; drop any pending commit.
    Hold,
}

/// Follow-up to a category pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryMove {
    Navigate(SearchLocation),
    GoHome,
    /// Already there, or nothing committable off the search page.
    Stay,
}

/// Result of adopting a new URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationSync {
    pub location: SearchLocation,
    /// The input box was rewritten from the URL.
    pub input_changed: bool,
}

#[derive(Debug)]
pub struct QuerySynchronizer {
    origin: Url,
    store_id: Option<String>,
    min_query_chars: usize,
    input: InputState,
    location: SearchLocation,
}

impl QuerySynchronizer {
    pub fn new(origin: Url, store_id: Option<String>, min_query_chars: usize) -> Self {
        Self {
            origin,
            store_id,
            min_query_chars,
            input: InputState::default(),
            location: SearchLocation::home(),
        }
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn location(&self) -> &SearchLocation {
        &self.location
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.input.text = text.into();
    }

    pub fn set_category(&mut self, category: CategoryScope) {
        self.input.category = category;
    }

    pub fn input_meets_minimum(&self) -> bool {
        text_meets_minimum(&self.input.text, &self.input.category, self.min_query_chars)
    }

    pub fn text_intent(&self) -> TextIntent {
        let empty = self.input.text.trim().is_empty();
        if empty && self.location.is_search() && !self.input.category.is_scoped() {
            TextIntent::GoHome
        } else if self.input_meets_minimum() {
            TextIntent::Commit
        } else {
            TextIntent::Hold
        }
    }

    /// Store the next search is scoped to: the last one a URL named, else
    /// the configured default.
    pub fn store_id(&self) -> Option<&str> {
        self.store_id.as_deref()
    }

    fn search_location(&self, query: SearchQuery) -> SearchLocation {
        SearchLocation::search(query, self.store_id.clone())
    }

    /// `Some` only when it differs from where we already are.
    fn unless_current(&self, target: SearchLocation) -> Option<SearchLocation> {
        (target != self.location).then_some(target)
    }

    /// Location for committing the typed text at page 1.
    pub fn commit_target(&self) -> Option<SearchLocation> {
        if !self.input_meets_minimum() {
            return None;
        }
        let query = SearchQuery::text(self.input.text.trim(), self.input.category.clone());
        self.unless_current(self.search_location(query))
    }

    /// Where picking a category leads. Image searches keep their image;
    /// text searches need committable text (or a scoped category). A search
    /// page whose input can no longer be committed goes home, so the URL
    /// never keeps a scope the input dropped.
    pub fn category_move(&self) -> CategoryMove {
        let current = &self.location.query;
        let target = if self.location.is_search() && current.is_image() {
            let query = current.with_category(self.input.category.clone());
            self.unless_current(self.search_location(query))
        } else if !self.input_meets_minimum() {
            return if self.location.is_search() {
                CategoryMove::GoHome
            } else {
                CategoryMove::Stay
            };
        } else {
            self.commit_target()
        };
        target.map_or(CategoryMove::Stay, CategoryMove::Navigate)
    }

    /// Same search at another page.
    pub fn page_target(&self, page: u32) -> ModelResult<Option<SearchLocation>> {
        if !self.location.is_search() {
            return Ok(None);
        }
        let query = self.location.query.with_page(page)?;
        Ok(self.unless_current(SearchLocation {
            query,
            ..self.location.clone()
        }))
    }

    pub fn image_target(&self, image_id: ImageId) -> SearchLocation {
        let query = SearchQuery::image(Some(image_id), self.input.category.clone());
        self.search_location(query)
    }

    /// Adopt `url` as the current location and pull the input box in line
    /// with it. Off the search route the input is left alone.
    pub fn apply_location(&mut self, url: &Url) -> LocationSync {
        let location = SearchLocation::from_url(url);
        let mut input_changed = false;

        if location.route == Route::Search {
            if let Some(store_id) = &location.store_id {
                self.store_id = Some(store_id.clone());
            }
            let query = &location.query;
            // Trailing whitespace the user is still typing is not a change.
            if query.trimmed_text() != self.input.text.trim()
                || query.category != self.input.category
            {
                self.input = InputState {
                    text: query.text.clone(),
                    category: query.category.clone(),
                };
                input_changed = true;
            }
        }

        self.location = location.clone();
        LocationSync {
            location,
            input_changed,
        }
    }

    pub fn url_for(&self, location: &SearchLocation) -> ModelResult<Url> {
        location.to_url(&self.origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://shop.example.com/").unwrap()
    }

    fn sync() -> QuerySynchronizer {
        QuerySynchronizer::new(origin(), Some("s1".into()), 2)
    }

    fn at(sync: &mut QuerySynchronizer, path: &str) -> LocationSync {
        sync.apply_location(&origin().join(path).unwrap())
    }

    #[test]
    fn commit_writes_query_category_and_first_page() {
        let mut sync = sync();
        at(&mut sync, "/searches?query=box&page=3&storeId=s1");
        sync.set_text("boxes ");
        sync.set_category(CategoryScope::from_param(Some("fonts")));

        let target = sync.commit_target().unwrap();
        assert_eq!(
            sync.url_for(&target).unwrap().as_str(),
            "https://shop.example.com/searches?query=boxes&categoryId=fonts&storeId=s1"
        );
    }

    #[test]
    fn committing_the_current_query_is_a_no_op() {
        let mut sync = sync();
        at(&mut sync, "/searches?query=boxes&storeId=s1");
        sync.set_text("boxes");
        assert_eq!(sync.commit_target(), None);
    }

    #[test]
    fn text_intent_follows_length_and_route() {
        let mut sync = sync();
        sync.set_text("b");
        assert_eq!(sync.text_intent(), TextIntent::Hold);
        sync.set_text("");
        assert_eq!(sync.text_intent(), TextIntent::Hold);

        at(&mut sync, "/searches?query=box&storeId=s1");
        sync.set_text("");
        assert_eq!(sync.text_intent(), TextIntent::GoHome);

        sync.set_category(CategoryScope::from_param(Some("fonts")));
        assert_eq!(sync.text_intent(), TextIntent::Commit);
    }

    #[test]
    fn location_changes_resync_input_once() {
        let mut sync = sync();
        let first = at(&mut sync, "/searches?query=box&categoryId=fonts");
        assert!(first.input_changed);
        assert_eq!(sync.input().text, "box");
        assert!(sync.input().category.is_scoped());

        let again = at(&mut sync, "/searches?query=box&categoryId=fonts&page=2");
        assert!(!again.input_changed);

        sync.set_text("typing");
        let home = at(&mut sync, "/");
        assert!(!home.input_changed);
        assert_eq!(sync.input().text, "typing");
    }

    #[test]
    fn page_target_keeps_everything_but_the_page() {
        let mut sync = sync();
        assert_eq!(sync.page_target(2).unwrap(), None);

        at(&mut sync, "/searches?imageSearch=true&imageId=img-1-0001&categoryId=fonts&storeId=s1");
        let target = sync.page_target(3).unwrap().unwrap();
        assert!(target.query.is_image());
        assert_eq!(target.query.page, 3);
        assert_eq!(target.query.category, CategoryScope::from_param(Some("fonts")));
        assert!(sync.page_target(0).is_err());
    }

    #[test]
    fn category_change_in_image_mode_keeps_the_image() {
        let mut sync = sync();
        at(&mut sync, "/searches?imageSearch=true&imageId=img-1-0001&page=2&storeId=s1");
        sync.set_category(CategoryScope::from_param(Some("icons")));

        let CategoryMove::Navigate(target) = sync.category_move() else {
            panic!("image search should move to the new category");
        };
        assert!(target.query.is_image());
        assert_eq!(target.query.image_id.unwrap().as_str(), "img-1-0001");
        assert_eq!(target.query.page, 1);
    }

    #[test]
    fn dropping_the_scope_of_a_category_only_search_goes_home() {
        let mut sync = sync();
        at(&mut sync, "/searches?query=&categoryId=fonts&storeId=s1");
        sync.set_category(CategoryScope::All);
        assert_eq!(sync.category_move(), CategoryMove::GoHome);

        sync.set_category(CategoryScope::from_param(Some("fonts")));
        assert_eq!(sync.category_move(), CategoryMove::Stay);

        let mut sync = self::sync();
        sync.set_category(CategoryScope::All);
        assert_eq!(sync.category_move(), CategoryMove::Stay);
    }

    #[test]
    fn store_from_the_url_outranks_the_configured_one() {
        let mut sync = sync();
        assert_eq!(sync.store_id(), Some("s1"));

        at(&mut sync, "/searches?query=box&storeId=other");
        assert_eq!(sync.store_id(), Some("other"));
        sync.set_text("boxes");
        let target = sync.commit_target().unwrap();
        assert_eq!(target.store_id.as_deref(), Some("other"));

        // Leaving the search page keeps the store for the next search.
        at(&mut sync, "/");
        assert_eq!(sync.store_id(), Some("other"));
    }
}
