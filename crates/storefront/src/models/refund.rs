//! Refund requests. Created and decided elsewhere; the storefront only reads
//! them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use haneul_core::{OrderId, RefundRequestId, RefundStatus, StatusDisplay, UserId};

use super::Row;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundRequest {
    pub id: RefundRequestId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub reason: String,
    pub status: RefundStatus,
    #[serde(default)]
    pub admin_note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Row for RefundRequest {
    const TABLE: &'static str = "refund_requests";
}

impl RefundRequest {
    #[must_use]
    pub const fn display(&self) -> StatusDisplay {
        self.status.display()
    }
}
