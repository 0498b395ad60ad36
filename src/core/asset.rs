use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Identifies a product within an asset category, e.g. `("Renda Fixa", "CDB")`.
///
/// Comparison ignores case and surrounding whitespace so that user-entered
/// names match the built-in tables.
#[derive(Debug, Clone, Eq, Deserialize, Serialize)]
pub struct AssetKey {
    pub category: String,
    pub product: String,
}

impl AssetKey {
    pub fn new(category: impl Into<String>, product: impl Into<String>) -> Self {
        AssetKey {
            category: category.into(),
            product: product.into(),
        }
    }

    pub fn matches(&self, category: &str, product: &str) -> bool {
        normalize(&self.category) == normalize(category)
            && normalize(&self.product) == normalize(product)
    }
}

impl PartialEq for AssetKey {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.category, &other.product)
    }
}

impl Display for AssetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.category, self.product)
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
