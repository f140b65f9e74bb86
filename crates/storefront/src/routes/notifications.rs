//! Notification route handlers.

use axum::{
    Json,
    extract::{Path, State},
};

use haneul_core::NotificationId;

use crate::backend::Backend;
use crate::error::{ApiResponse, Result};
use crate::middleware::RequireUser;
use crate::models::Notification;
use crate::services::Toast;
use crate::state::AppState;

/// `GET /api/notifications`
pub async fn index<B: Backend>(
    State(state): State<AppState<B>>,
    RequireUser(user): RequireUser,
) -> Result<Json<ApiResponse<Vec<Notification>>>> {
    let notifications = state.store().notifications(&user).await?;
    Ok(ApiResponse::data(notifications))
}

/// `GET /api/notifications/unread-count`
pub async fn unread_count<B: Backend>(
    State(state): State<AppState<B>>,
    RequireUser(user): RequireUser,
) -> Result<Json<ApiResponse<usize>>> {
    let count = state.store().unread_count(&user).await?;
    Ok(ApiResponse::data(count))
}

/// `PATCH /api/notifications/read-all`
///
/// `data` is the number of notifications that changed.
pub async fn read_all<B: Backend>(
    State(state): State<AppState<B>>,
    RequireUser(user): RequireUser,
) -> Result<Json<ApiResponse<usize>>> {
    let changed = state.store().mark_all_as_read(&user).await?;
    Ok(ApiResponse::with_toast(
        changed,
        Toast::all_notifications_read(),
    ))
}

/// `PATCH /api/notifications/{id}/read`
pub async fn read<B: Backend>(
    State(state): State<AppState<B>>,
    RequireUser(user): RequireUser,
    Path(id): Path<NotificationId>,
) -> Result<Json<ApiResponse<()>>> {
    state.store().mark_as_read(&user, id).await?;
    Ok(ApiResponse::data(()))
}

/// `DELETE /api/notifications/{id}`
pub async fn delete<B: Backend>(
    State(state): State<AppState<B>>,
    RequireUser(user): RequireUser,
    Path(id): Path<NotificationId>,
) -> Result<Json<ApiResponse<()>>> {
    state.store().delete_notification(&user, id).await?;
    Ok(ApiResponse::with_toast((), Toast::notification_deleted()))
}
