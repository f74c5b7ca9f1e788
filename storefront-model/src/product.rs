use serde::{Deserialize, Deserializer, Serialize};

use crate::ids::{CategoryId, ProductId};

/// A catalog product as returned by the search endpoints.
///
/// Everything except `id` is optional on the wire; absent or `null` fields
/// deserialize to empty defaults so the presenter never sees a hole.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub id: ProductId,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub slug: String,
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub currency: String,
    #[serde(default, alias = "image", alias = "thumbnail")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}

impl Product {
    /// Human readable price, e.g. `"12.50 USD"`. Products without a price
    /// (free goods) read as `"Free"`.
    pub fn display_price(&self) -> String {
        match self.price {
            Some(price) if price > 0.0 => {
                if self.currency.is_empty() {
                    format!("{price:.2}")
                } else {
                    format!("{price:.2} {}", self.currency)
                }
            }
            _ => "Free".to_string(),
        }
    }
}

fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Prices arrive as numbers or as decimal strings depending on the store.
fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum WirePrice {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<WirePrice>::deserialize(deserializer)? {
        None => None,
        Some(WirePrice::Number(n)) => Some(n),
        Some(WirePrice::Text(s)) => s.trim().parse().ok(),
    })
}
