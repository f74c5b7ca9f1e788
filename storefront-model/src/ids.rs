use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ModelError;

/// The admin API is inconsistent about id types (numeric for legacy
/// products, strings for everything newer), so ids accept both.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl From<WireId> for String {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Text(text) => text.trim().to_string(),
            WireId::Signed(n) => n.to_string(),
            WireId::Unsigned(n) => n.to_string(),
        }
    }
}

/// Catalog product identifier as issued by the admin API.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        // `null` ids survive decoding as empty and are dropped during
        // response normalization.
        Option::<WireId>::deserialize(deserializer)
            .map(|id| Self(id.map(String::from).unwrap_or_default()))
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Catalog category identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CategoryId(pub String);

impl CategoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for CategoryId {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        WireId::deserialize(deserializer).map(|id| Self(id.into()))
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Optional category filter. `All` is the unscoped sentinel and is spelled
/// `"all"` wherever it crosses a string boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum CategoryScope {
    #[default]
    All,
    Category(CategoryId),
}

impl CategoryScope {
    pub const ALL: &'static str = "all";

    /// Parse a raw parameter value. Missing, blank and `"all"` values are
    /// unscoped.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::All,
            Some(value) if value.eq_ignore_ascii_case(Self::ALL) => Self::All,
            Some(value) => Self::Category(CategoryId::new(value)),
        }
    }

    /// Value for an outgoing request, `None` when unscoped.
    pub fn as_param(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Category(id) => Some(id.as_str()),
        }
    }

    pub fn is_scoped(&self) -> bool {
        matches!(self, Self::Category(_))
    }
}

impl fmt::Display for CategoryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(Self::ALL),
            Self::Category(id) => f.write_str(id.as_str()),
        }
    }
}

impl From<CategoryId> for CategoryScope {
    fn from(id: CategoryId) -> Self {
        Self::Category(id)
    }
}

/// Key of a search image held in the session image cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageId(String);

impl ImageId {
    const MAX_LEN: usize = 64;

    /// Validate an id coming from an untrusted source such as a URL.
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        let trimmed = raw.trim();
        let valid = !trimmed.is_empty()
            && trimmed.len() <= Self::MAX_LEN
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(ModelError::InvalidImageId(raw.to_string()))
        }
    }

    /// Fresh id of the form `img-<unix millis>-<4 hex digits>`.
    pub fn generated(unix_millis: i64, nonce: u16) -> Self {
        Self(format!("img-{}-{:04x}", unix_millis.max(0), nonce))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
