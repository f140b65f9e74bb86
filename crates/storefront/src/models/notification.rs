//! In-app notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use haneul_core::{NotificationId, NotificationType, StatusDisplay, UserId};

use super::Row;

/// A notification (`notifications` table).
///
/// The read flag only moves from unread to read; nothing in the storefront
/// sets it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    /// In-app path of the related entity, e.g. `/orders/<id>`.
    #[serde(default)]
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Row for Notification {
    const TABLE: &'static str = "notifications";
}

impl Notification {
    /// Badge for the notification type.
    #[must_use]
    pub const fn display(&self) -> StatusDisplay {
        self.kind.display()
    }
}

/// Count of unread entries in a list.
#[must_use]
pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.is_read).count()
}
