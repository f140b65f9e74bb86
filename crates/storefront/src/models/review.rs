//! Product reviews.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use haneul_core::{ProductId, Rating, ReviewId, UserId};

use super::Row;

/// A review (`reviews` table). One per (user, product).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub rating: Rating,
    pub content: String,
    #[serde(default)]
    pub author_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Row for Review {
    const TABLE: &'static str = "reviews";
}

/// Insert payload for [`Review`].
#[derive(Debug, Clone, Serialize)]
pub struct NewReview {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub rating: Rating,
    pub content: String,
    pub author_name: String,
}
