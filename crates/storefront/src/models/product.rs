//! Catalog types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use haneul_core::{CategoryId, Price, ProductId};

use super::Row;

const fn default_true() -> bool {
    true
}

/// A product as stored in the `products` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// Korean name.
    pub name: String,
    /// English name, when the catalog has one.
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Listed for sale.
    #[serde(default = "default_true")]
    pub is_available: bool,
    /// Manually flagged sold out, independent of `stock`.
    #[serde(default)]
    pub is_out_of_stock: bool,
    /// Units left; `None` means stock is not tracked.
    #[serde(default)]
    pub stock: Option<i32>,
    #[serde(default)]
    pub likes_count: i32,
    #[serde(default)]
    pub reviews_count: i32,
    pub created_at: DateTime<Utc>,
}

impl Row for Product {
    const TABLE: &'static str = "products";
}

impl Product {
    /// Name in the requested locale, falling back to Korean.
    #[must_use]
    pub fn localized_name(&self, english: bool) -> &str {
        match (&self.name_en, english) {
            (Some(name), true) => name,
            _ => &self.name,
        }
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub name_en: Option<String>,
    pub slug: String,
}

impl Row for Category {
    const TABLE: &'static str = "categories";
}
