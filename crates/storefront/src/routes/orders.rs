//! Order, delivery tracking and refund route handlers.

use axum::{
    Json,
    extract::{Path, State},
};

use haneul_core::{OrderId, UserId};

use crate::backend::Backend;
use crate::error::{ApiResponse, AppError, Result};
use crate::middleware::{OptionalUser, RequireUser};
use crate::models::{Order, RefundRequest, ShippingInfo, TrackingView};
use crate::services::{StoreError, Toast};
use crate::state::AppState;

/// `GET /api/orders`
pub async fn index<B: Backend>(
    State(state): State<AppState<B>>,
    RequireUser(user): RequireUser,
) -> Result<Json<ApiResponse<Vec<Order>>>> {
    let orders = state.store().orders(&user).await?;
    Ok(ApiResponse::data(orders))
}

/// `POST /api/orders`
pub async fn create<B: Backend>(
    State(state): State<AppState<B>>,
    OptionalUser(user): OptionalUser,
    Json(shipping): Json<ShippingInfo>,
) -> Result<Json<ApiResponse<Order>>> {
    let order = state.store().create_order(user.as_ref(), shipping).await?;
    Ok(ApiResponse::with_toast(order, Toast::order_created()))
}

/// `GET /api/orders/{id}`
pub async fn show<B: Backend>(
    State(state): State<AppState<B>>,
    RequireUser(user): RequireUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<ApiResponse<Order>>> {
    let order = state.store().order(&user, order_id).await?;
    Ok(ApiResponse::data(order))
}

/// `POST /api/orders/{id}/cancel`
pub async fn cancel<B: Backend>(
    State(state): State<AppState<B>>,
    RequireUser(user): RequireUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<ApiResponse<Order>>> {
    let order = state.store().cancel_order(&user, order_id).await?;
    Ok(ApiResponse::with_toast(order, Toast::order_cancelled()))
}

/// `GET /api/orders/{id}/tracking`
///
/// `data` is `null` until the order has shipped.
pub async fn tracking<B: Backend>(
    State(state): State<AppState<B>>,
    RequireUser(user): RequireUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<ApiResponse<Option<TrackingView>>>> {
    let tracking = state.store().delivery_tracking(&user, order_id).await?;
    Ok(ApiResponse::data(tracking))
}

/// `GET /api/refund-requests/check/{order_id}`
pub async fn refund_check<B: Backend>(
    State(state): State<AppState<B>>,
    RequireUser(user): RequireUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<ApiResponse<Option<RefundRequest>>>> {
    let refund = state.store().refund_for_order(&user, order_id).await?;
    Ok(ApiResponse::data(refund))
}

/// `GET /api/refund-requests/user/{user_id}`
///
/// Only the signed-in user's own list is served.
pub async fn refund_requests<B: Backend>(
    State(state): State<AppState<B>>,
    RequireUser(user): RequireUser,
    Path(user_id): Path<UserId>,
) -> Result<Json<ApiResponse<Vec<RefundRequest>>>> {
    if user_id != user.id {
        tracing::warn!(user_id = %user.id, requested = %user_id, "Refund list of another user requested");
        return Err(AppError::from(StoreError::Forbidden));
    }
    let refunds = state.store().refund_requests(&user).await?;
    Ok(ApiResponse::data(refunds))
}
