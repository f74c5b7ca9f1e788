use storefront_model::category::scope_label;
use storefront_model::{Category, Product, SearchQuery, SearchResponse};

use super::types::SearchStatus;

/// Largest number of page links shown at once.
pub const PAGE_WINDOW: u32 = 5;

const REUPLOAD_MESSAGE: &str =
    "Your search image is no longer available. Please upload it again.";

/// One result tile.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub price: String,
    pub image_url: Option<String>,
    pub href: String,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        let handle = if product.slug.is_empty() {
            product.id.as_str()
        } else {
            product.slug.as_str()
        };
        let name = if product.name.trim().is_empty() {
            "Untitled product".to_string()
        } else {
            product.name.trim().to_string()
        };
        Self {
            id: product.id.to_string(),
            name,
            price: product.display_price(),
            image_url: product.image_url.clone().filter(|url| !url.is_empty()),
            href: format!("/products/{handle}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_count: u32,
    pub has_previous: bool,
    pub has_next: bool,
    /// Page numbers to render as links, centred on `page` where possible.
    pub window: Vec<u32>,
}

impl Pagination {
    pub fn new(page: u32, page_count: u32) -> Self {
        let page_count = page_count.max(1);
        let page = page.clamp(1, page_count);
        let span = PAGE_WINDOW.min(page_count);
        let start = page
            .saturating_sub(PAGE_WINDOW / 2)
            .max(1)
            .min(page_count - span + 1);
        Self {
            page,
            page_count,
            has_previous: page > 1,
            has_next: page < page_count,
            window: (start..start + span).collect(),
        }
    }

    /// Only worth rendering with more than one page.
    pub fn is_visible(&self) -> bool {
        self.page_count > 1
    }
}

/// Everything the results area can show.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultsView {
    Idle,
    Loading {
        heading: String,
    },
    Empty {
        query_text: String,
        heading: String,
        /// Server guidance, e.g. why an image matched nothing.
        info: Option<String>,
    },
    Results {
        heading: String,
        items: Vec<ProductCard>,
        total: u64,
        pagination: Pagination,
        info: Option<String>,
    },
    ReuploadRequired {
        message: String,
    },
    Misconfigured {
        message: String,
    },
}

impl ResultsView {
    pub fn misconfigured(reason: impl std::fmt::Display) -> Self {
        Self::Misconfigured {
            message: format!("Search is not configured: {reason}"),
        }
    }
}

/// Builds the results area from the coordinator's status. Never sees errors;
/// a failed search already arrives as an empty response.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultsPresenter;

impl ResultsPresenter {
    pub fn present(status: &SearchStatus, categories: &[Category]) -> ResultsView {
        match status {
            SearchStatus::Idle => ResultsView::Idle,
            SearchStatus::Loading { query } => ResultsView::Loading {
                heading: heading(query, categories),
            },
            SearchStatus::ReuploadRequired { .. } => ResultsView::ReuploadRequired {
                message: REUPLOAD_MESSAGE.to_string(),
            },
            SearchStatus::Ready { query, response } => {
                present_response(query, response, categories)
            }
        }
    }
}

fn present_response(
    query: &SearchQuery,
    response: &SearchResponse,
    categories: &[Category],
) -> ResultsView {
    if response.results.is_empty() {
        return ResultsView::Empty {
            query_text: query.trimmed_text().to_string(),
            heading: heading(query, categories),
            info: response.info.clone(),
        };
    }
    ResultsView::Results {
        heading: heading(query, categories),
        items: response.results.iter().map(ProductCard::from).collect(),
        total: response.total,
        pagination: Pagination::new(response.page, response.page_count),
        info: response.info.clone(),
    }
}

fn heading(query: &SearchQuery, categories: &[Category]) -> String {
    let subject = if query.is_image() {
        "Results for your image".to_string()
    } else if query.trimmed_text().is_empty() {
        "All products".to_string()
    } else {
        format!("Results for \"{}\"", query.trimmed_text())
    };
    if query.category.is_scoped() {
        format!("{subject} in {}", scope_label(&query.category, categories))
    } else {
        subject
    }
}
