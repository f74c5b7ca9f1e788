use crate::error::{ModelError, Result};
use crate::ids::{CategoryScope, ImageId};

/// Whether a search is driven by typed text or an uploaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SearchMode {
    #[default]
    Text,
    Image,
}

/// One immutable search request, rebuilt from the URL on every navigation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchQuery {
    pub text: String,
    pub category: CategoryScope,
    /// 1-based.
    pub page: u32,
    pub mode: SearchMode,
    /// Session image cache key, only meaningful in [`SearchMode::Image`].
    pub image_id: Option<ImageId>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            text: String::new(),
            category: CategoryScope::All,
            page: 1,
            mode: SearchMode::Text,
            image_id: None,
        }
    }
}

impl SearchQuery {
    pub fn text(text: impl Into<String>, category: CategoryScope) -> Self {
        Self {
            text: text.into(),
            category,
            ..Self::default()
        }
    }

    pub fn image(image_id: Option<ImageId>, category: CategoryScope) -> Self {
        Self {
            category,
            mode: SearchMode::Image,
            image_id,
            ..Self::default()
        }
    }

    /// Copy of this query at another page.
    pub fn with_page(&self, page: u32) -> Result<Self> {
        if page == 0 {
            return Err(ModelError::InvalidPage(page));
        }
        Ok(Self {
            page,
            ..self.clone()
        })
    }

    /// Copy of this query scoped to another category. Pagination restarts.
    pub fn with_category(&self, category: CategoryScope) -> Self {
        Self {
            category,
            page: 1,
            ..self.clone()
        }
    }

    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }

    /// Text queries need `min_chars` characters unless a category is
    /// selected, in which case any text (including none) is accepted.
    pub fn meets_minimum(&self, min_chars: usize) -> bool {
        text_meets_minimum(&self.text, &self.category, min_chars)
    }

    pub fn is_image(&self) -> bool {
        self.mode == SearchMode::Image
    }
}

/// Shared length rule for queries and for raw input that is not yet a query.
pub fn text_meets_minimum(
    text: &str,
    category: &CategoryScope,
    min_chars: usize,
) -> bool {
    category.is_scoped() || text.trim().chars().count() >= min_chars
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimum_length_is_waived_for_scoped_categories() {
        let unscoped = SearchQuery::text("b", CategoryScope::All);
        assert!(!unscoped.meets_minimum(2));
        assert!(SearchQuery::text("bo", CategoryScope::All).meets_minimum(2));
        assert!(!SearchQuery::text("  b  ", CategoryScope::All).meets_minimum(2));

        let scoped =
            SearchQuery::text("", CategoryScope::from_param(Some("fonts")));
        assert!(scoped.meets_minimum(2));
    }

    #[test]
    fn minimum_length_counts_characters_not_bytes() {
        assert!(!SearchQuery::text("é", CategoryScope::All).meets_minimum(2));
        assert!(SearchQuery::text("éé", CategoryScope::All).meets_minimum(2));
    }

    #[test]
    fn page_zero_is_rejected_and_category_change_resets_page() {
        let query = SearchQuery::text("boxes", CategoryScope::All);
        assert_eq!(query.with_page(0), Err(ModelError::InvalidPage(0)));

        let paged = query.with_page(3).unwrap();
        assert_eq!(paged.page, 3);
        assert_eq!(
            paged
                .with_category(CategoryScope::from_param(Some("7")))
                .page,
            1
        );
    }
}
