use serde::{Deserialize, Serialize};

use crate::ids::{CategoryId, CategoryScope};

/// Catalog category used to scope searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    #[serde(default)]
    pub name: String,
}

impl Category {
    pub fn scope(&self) -> CategoryScope {
        CategoryScope::Category(self.id.clone())
    }
}

/// Label for a scope given the loaded category list. Unknown ids fall back to
/// the raw id so a shared URL still renders something meaningful.
pub fn scope_label(scope: &CategoryScope, categories: &[Category]) -> String {
    match scope {
        CategoryScope::All => "All categories".to_string(),
        CategoryScope::Category(id) => categories
            .iter()
            .find(|category| &category.id == id)
            .map(|category| category.name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| id.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_resolve_through_loaded_categories() {
        let categories = vec![Category {
            id: CategoryId::new("3"),
            name: "Fonts".into(),
        }];

        assert_eq!(scope_label(&CategoryScope::All, &categories), "All categories");
        assert_eq!(
            scope_label(&CategoryScope::from_param(Some("3")), &categories),
            "Fonts"
        );
        assert_eq!(
            scope_label(&CategoryScope::from_param(Some("99")), &categories),
            "99"
        );
    }
}
