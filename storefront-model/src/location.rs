//! Mapping between search state and the shareable URL.
//!
//! Every piece of search-page state lives in the query string so a copied
//! URL reproduces the same result set. Image searches are the exception:
//! the id only resolves inside the session that uploaded the image.

use url::Url;

use crate::error::{ModelError, Result};
use crate::ids::{CategoryScope, ImageId};
use crate::query::{SearchMode, SearchQuery};

pub const HOME_PATH: &str = "/";
pub const SEARCH_PATH: &str = "/searches";

pub const PARAM_QUERY: &str = "query";
pub const PARAM_CATEGORY: &str = "categoryId";
pub const PARAM_PAGE: &str = "page";
pub const PARAM_STORE: &str = "storeId";
pub const PARAM_IMAGE_SEARCH: &str = "imageSearch";
pub const PARAM_IMAGE_ID: &str = "imageId";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Search,
    Other(String),
}

impl Route {
    fn from_path(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Route::Home,
            SEARCH_PATH => Route::Search,
            other => Route::Other(other.to_string()),
        }
    }

    fn path(&self) -> &str {
        match self {
            Route::Home => HOME_PATH,
            Route::Search => SEARCH_PATH,
            Route::Other(path) => path,
        }
    }
}

/// Decoded view of a storefront URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchLocation {
    pub route: Route,
    pub query: SearchQuery,
    pub store_id: Option<String>,
}

impl SearchLocation {
    pub fn home() -> Self {
        Self {
            route: Route::Home,
            query: SearchQuery::default(),
            store_id: None,
        }
    }

    pub fn search(query: SearchQuery, store_id: Option<String>) -> Self {
        Self {
            route: Route::Search,
            query,
            store_id,
        }
    }

    pub fn is_search(&self) -> bool {
        self.route == Route::Search
    }

    /// Decode a URL. Decoding is lenient: unknown parameters are ignored and
    /// malformed values fall back to their defaults.
    pub fn from_url(url: &Url) -> Self {
        let mut text = None;
        let mut category = None;
        let mut page = 1;
        let mut store_id = None;
        let mut image_search = false;
        let mut image_id = None;

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                PARAM_QUERY => text = Some(value.into_owned()),
                PARAM_CATEGORY => category = Some(value.into_owned()),
                PARAM_PAGE => {
                    page = value
                        .trim()
                        .parse::<u32>()
                        .ok()
                        .filter(|p| *p >= 1)
                        .unwrap_or(1)
                }
                PARAM_STORE => {
                    store_id = Some(value.trim().to_string())
                        .filter(|s| !s.is_empty())
                }
                PARAM_IMAGE_SEARCH => image_search = value == "true",
                PARAM_IMAGE_ID => image_id = ImageId::parse(&value).ok(),
                _ => {}
            }
        }

        let query = SearchQuery {
            text: text.unwrap_or_default(),
            category: CategoryScope::from_param(category.as_deref()),
            page,
            mode: if image_search {
                SearchMode::Image
            } else {
                SearchMode::Text
            },
            image_id: image_search.then_some(image_id).flatten(),
        };

        Self {
            route: Route::from_path(url.path()),
            query,
            store_id,
        }
    }

    /// Encode against the site origin. Defaults (`categoryId=all`, `page=1`)
    /// are left out so URLs stay short.
    pub fn to_url(&self, origin: &Url) -> Result<Url> {
        let mut url = origin
            .join(self.route.path())
            .map_err(|err| ModelError::InvalidLocation(err.to_string()))?;
        url.set_query(None);
        url.set_fragment(None);

        if self.route == Route::Home {
            return Ok(url);
        }

        {
            let mut pairs = url.query_pairs_mut();
            match self.query.mode {
                SearchMode::Text => {
                    pairs.append_pair(PARAM_QUERY, &self.query.text);
                }
                SearchMode::Image => {
                    pairs.append_pair(PARAM_IMAGE_SEARCH, "true");
                    if let Some(image_id) = &self.query.image_id {
                        pairs.append_pair(PARAM_IMAGE_ID, image_id.as_str());
                    }
                }
            }
            if let Some(category) = self.query.category.as_param() {
                pairs.append_pair(PARAM_CATEGORY, category);
            }
            if self.query.page > 1 {
                pairs.append_pair(PARAM_PAGE, &self.query.page.to_string());
            }
            if let Some(store_id) = &self.store_id {
                pairs.append_pair(PARAM_STORE, store_id);
            }
        }

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://shop.example.com/").unwrap()
    }

    fn round_trip(location: &SearchLocation) -> SearchLocation {
        let url = location.to_url(&origin()).unwrap();
        SearchLocation::from_url(&url)
    }

    #[test]
    fn text_queries_round_trip() {
        let cases = [
            SearchQuery::text("boxes", CategoryScope::All),
            SearchQuery::text("gift & wrap / 50%", CategoryScope::All)
                .with_page(4)
                .unwrap(),
            SearchQuery::text("", CategoryScope::from_param(Some("12"))),
            SearchQuery::text("ünïcödé", CategoryScope::from_param(Some("a b"))),
        ];

        for query in cases {
            let location =
                SearchLocation::search(query.clone(), Some("store-1".into()));
            let decoded = round_trip(&location);
            assert_eq!(decoded.query, query);
            assert_eq!(decoded.route, Route::Search);
            assert_eq!(decoded.store_id.as_deref(), Some("store-1"));
        }
    }

    #[test]
    fn image_queries_round_trip() {
        let image_id = ImageId::parse("img-1700000000000-00ff").unwrap();
        let query = SearchQuery::image(
            Some(image_id),
            CategoryScope::from_param(Some("5")),
        )
        .with_page(2)
        .unwrap();
        let decoded = round_trip(&SearchLocation::search(query.clone(), None));
        assert_eq!(decoded.query, query);
    }

    #[test]
    fn defaults_are_omitted_from_urls() {
        let location = SearchLocation::search(
            SearchQuery::text("box", CategoryScope::All),
            None,
        );
        let url = location.to_url(&origin()).unwrap();
        assert_eq!(url.as_str(), "https://shop.example.com/searches?query=box");
        assert_eq!(
            SearchLocation::home().to_url(&origin()).unwrap().as_str(),
            "https://shop.example.com/"
        );
    }

    #[test]
    fn malformed_parameters_fall_back_to_defaults() {
        let url = Url::parse(
            "https://shop.example.com/searches?query=box&page=zero&categoryId=all&imageId=x",
        )
        .unwrap();
        let decoded = SearchLocation::from_url(&url);
        assert_eq!(decoded.query.page, 1);
        assert_eq!(decoded.query.category, CategoryScope::All);
        assert_eq!(decoded.query.mode, SearchMode::Text);
        assert_eq!(decoded.query.image_id, None);

        let url =
            Url::parse("https://shop.example.com/searches?page=0").unwrap();
        assert_eq!(SearchLocation::from_url(&url).query.page, 1);
    }

    #[test]
    fn routes_are_recognised_with_trailing_slashes() {
        let search = Url::parse("https://shop.example.com/searches/").unwrap();
        assert!(SearchLocation::from_url(&search).is_search());

        let other = Url::parse("https://shop.example.com/cart").unwrap();
        assert_eq!(
            SearchLocation::from_url(&other).route,
            Route::Other("/cart".into())
        );
    }
}
