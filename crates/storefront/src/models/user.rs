//! Signed-in user.

use serde::{Deserialize, Serialize};

use haneul_core::{Price, UserId};

/// The signed-in user as reported by the backend session.
///
/// Built from the auth service's user object and its metadata. The copy kept
/// in the storefront session is advisory; the backend session is the source
/// of truth and is re-checked on `GET /api/auth/session`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Display name.
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    /// Reward points balance.
    #[serde(default)]
    pub points: i64,
    /// Unused coupons.
    #[serde(default)]
    pub coupons: i32,
    /// Orders placed so far.
    #[serde(default)]
    pub total_orders: i32,
    /// Lifetime spend.
    #[serde(default)]
    pub total_spent: Price,
}
