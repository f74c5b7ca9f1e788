use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::product::Product;

/// Search payload exactly as the catalog API sends it. Every field may be
/// missing or `null`; products are kept as raw JSON so one malformed entry
/// cannot sink the whole page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSearchPayload {
    #[serde(default)]
    pub results: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub info: Option<String>,
}

/// Counts arrive as integers, as floats (`57.0`) or as strings (`"3"`).
/// Anything that is not a non-negative whole number in range reads as absent.
fn lenient_count<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum WireCount {
        Whole(u64),
        Float(f64),
        Text(String),
    }

    let whole = |n: f64| (n.is_finite() && n >= 0.0 && n.fract() == 0.0).then_some(n as u64);
    let count = match Option::<WireCount>::deserialize(deserializer)? {
        None => None,
        Some(WireCount::Whole(n)) => Some(n),
        Some(WireCount::Float(n)) => whole(n),
        Some(WireCount::Text(s)) => s.trim().parse::<f64>().ok().and_then(whole),
    };
    Ok(count.and_then(|n| T::try_from(n).ok()))
}

/// Autocomplete payload, `{ "suggestions": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutocompletePayload {
    #[serde(default)]
    pub suggestions: Option<Vec<Option<String>>>,
}

impl AutocompletePayload {
    /// Trimmed, de-duplicated, non-empty suggestions in server order, capped
    /// at `limit`.
    pub fn into_suggestions(self, limit: usize) -> Vec<String> {
        let mut seen = HashSet::new();
        self.suggestions
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .filter(|s| seen.insert(s.to_lowercase()))
            .take(limit)
            .collect()
    }
}

/// Normalized result page handed to the presenter.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResponse {
    /// Unique by product id, first-seen order.
    pub results: Vec<Product>,
    pub total: u64,
    pub page: u32,
    pub page_count: u32,
    pub info: Option<String>,
}

impl Default for SearchResponse {
    fn default() -> Self {
        Self::empty()
    }
}

impl SearchResponse {
    /// The state shown after a failed search.
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            total: 0,
            page: 1,
            page_count: 1,
            info: None,
        }
    }

    /// Normalize a raw payload for the page that was requested.
    ///
    /// A page beyond the last one yields no results and reports the last
    /// valid page, so `page <= page_count` always holds.
    pub fn from_payload(
        raw: RawSearchPayload,
        requested_page: u32,
        limit: u32,
    ) -> Self {
        let total = raw.total.unwrap_or(0);
        let page_count = raw
            .page_count
            .filter(|count| *count > 0)
            .unwrap_or_else(|| page_count_for(total, limit));
        let requested_page = requested_page.max(1);
        let info = raw
            .info
            .map(|info| info.trim().to_string())
            .filter(|info| !info.is_empty());

        if requested_page > page_count {
            return Self {
                results: Vec::new(),
                total,
                page: page_count,
                page_count,
                info,
            };
        }

        let mut seen = HashSet::new();
        let results = raw
            .results
            .unwrap_or_default()
            .into_iter()
            .filter_map(|value| serde_json::from_value::<Product>(value).ok())
            .filter(|product| !product.id.is_empty())
            .filter(|product| seen.insert(product.id.clone()))
            .collect();

        Self {
            results,
            total,
            page: requested_page,
            page_count,
            info,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// `ceil(total / limit)`, never less than one page.
pub fn page_count_for(total: u64, limit: u32) -> u32 {
    let limit = u64::from(limit.max(1));
    let pages = total.div_ceil(limit).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}
