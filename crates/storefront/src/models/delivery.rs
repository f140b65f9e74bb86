//! Courier tracking for an order.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use haneul_core::{DeliveryStatus, OrderId, StatusDisplay, TrackingId};

use super::Row;

/// Tracking record (`delivery_tracking` table), written by the fulfilment
/// side and only read here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryTracking {
    pub id: TrackingId,
    pub order_id: OrderId,
    pub courier: String,
    pub tracking_number: String,
    pub status: DeliveryStatus,
    #[serde(default)]
    pub estimated_delivery: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

impl Row for DeliveryTracking {
    const TABLE: &'static str = "delivery_tracking";
}

/// Tracking record plus its rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingView {
    #[serde(flatten)]
    pub tracking: DeliveryTracking,
    pub display: StatusDisplay,
    pub progress_step: Option<u8>,
    pub is_terminal: bool,
}

impl From<DeliveryTracking> for TrackingView {
    fn from(tracking: DeliveryTracking) -> Self {
        Self {
            display: tracking.status.display(),
            progress_step: tracking.status.progress_step(),
            is_terminal: tracking.status.is_terminal(),
            tracking,
        }
    }
}
