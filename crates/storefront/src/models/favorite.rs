//! Favorites ("찜").
//!
//! A favorite is a (user, product) membership; the row carries nothing else
//! of interest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use haneul_core::{FavoriteId, ProductId, UserId};

use super::{Product, Row};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: FavoriteId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub created_at: DateTime<Utc>,
}

impl Row for Favorite {
    const TABLE: &'static str = "favorites";
}

/// Insert payload for [`Favorite`].
#[derive(Debug, Clone, Serialize)]
pub struct NewFavorite {
    pub user_id: UserId,
    pub product_id: ProductId,
}

/// A favorite joined with its product, for the favorites page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FavoriteProduct {
    pub favorite: Favorite,
    pub product: Product,
}
