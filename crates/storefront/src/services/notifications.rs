//! Notification inbox.
//!
//! Read state only moves one way: unread to read.

use tracing::instrument;

use haneul_core::NotificationId;

use super::{StoreError, Storefront, write_failed};
use crate::backend::{Backend, BackendError, Filter};
use crate::models::{Notification, User};
use crate::query::{MutationContext, MutationKind, QueryKey};

#[derive(serde::Serialize)]
struct MarkRead {
    is_read: bool,
}

const MARK_READ: MarkRead = MarkRead { is_read: true };

impl<B: Backend> Storefront<B> {
    /// The user's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Remote` if the read fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn notifications(&self, user: &User) -> Result<Vec<Notification>, StoreError> {
        let user_id = user.id;
        self.read(QueryKey::Notifications(user_id), |backend| async move {
            backend
                .select(&Filter::new().eq("user_id", user_id).order_desc("created_at"))
                .await
        })
        .await
    }

    /// Number of unread notifications.
    ///
    /// # Errors
    ///
    /// Returns `Remote` if the read fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn unread_count(&self, user: &User) -> Result<usize, StoreError> {
        let user_id = user.id;
        self.read(QueryKey::UnreadCount(user_id), |backend| async move {
            let unread: Vec<Notification> = backend
                .select(&Filter::new().eq("user_id", user_id).eq("is_read", false))
                .await?;
            Ok::<_, BackendError>(unread.len())
        })
        .await
    }

    /// Mark one notification read.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if it is not the user's.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn mark_as_read(&self, user: &User, id: NotificationId) -> Result<(), StoreError> {
        let kind = MutationKind::MarkNotificationRead;
        let (_guard, backend) = self.begin(kind, user)?;

        let updated: Vec<Notification> = backend
            .update(&Filter::new().eq("id", id).eq("user_id", user.id), &MARK_READ)
            .await
            .map_err(|err| write_failed(kind, err))?;
        if updated.is_empty() {
            return Err(StoreError::NotFound);
        }

        self.complete(kind, MutationContext::user(user.id)).await;
        Ok(())
    }

    /// Mark every unread notification read; returns how many changed.
    ///
    /// # Errors
    ///
    /// Returns `Remote` if the write fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn mark_all_as_read(&self, user: &User) -> Result<usize, StoreError> {
        let kind = MutationKind::MarkAllNotificationsRead;
        let (_guard, backend) = self.begin(kind, user)?;

        let updated: Vec<Notification> = backend
            .update(
                &Filter::new().eq("user_id", user.id).eq("is_read", false),
                &MARK_READ,
            )
            .await
            .map_err(|err| write_failed(kind, err))?;

        self.complete(kind, MutationContext::user(user.id)).await;
        Ok(updated.len())
    }

    /// Delete one notification.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if it is not the user's.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn delete_notification(&self, user: &User, id: NotificationId) -> Result<(), StoreError> {
        let kind = MutationKind::DeleteNotification;
        let (_guard, backend) = self.begin(kind, user)?;

        let removed = backend
            .delete::<Notification>(&Filter::new().eq("id", id).eq("user_id", user.id))
            .await
            .map_err(|err| write_failed(kind, err))?;
        if removed == 0 {
            return Err(StoreError::NotFound);
        }

        self.complete(kind, MutationContext::user(user.id)).await;
        Ok(())
    }
}
