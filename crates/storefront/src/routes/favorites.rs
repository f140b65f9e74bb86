//! Favorite route handlers.

use axum::{
    Json,
    extract::{Path, State},
};

use haneul_core::ProductId;

use crate::backend::Backend;
use crate::error::{ApiResponse, Result};
use crate::middleware::{OptionalUser, RequireUser};
use crate::models::FavoriteProduct;
use crate::services::Toast;
use crate::state::AppState;

/// `GET /api/favorites`
pub async fn index<B: Backend>(
    State(state): State<AppState<B>>,
    RequireUser(user): RequireUser,
) -> Result<Json<ApiResponse<Vec<FavoriteProduct>>>> {
    let favorites = state.store().favorites(&user).await?;
    Ok(ApiResponse::data(favorites))
}

/// `GET /api/favorites/{product_id}`
///
/// Signed-out visitors simply get `false`.
pub async fn status<B: Backend>(
    State(state): State<AppState<B>>,
    OptionalUser(user): OptionalUser,
    Path(product_id): Path<ProductId>,
) -> Result<Json<ApiResponse<bool>>> {
    let favorited = match user {
        Some(user) => state.store().is_favorite(&user, product_id).await?,
        None => false,
    };
    Ok(ApiResponse::data(favorited))
}

/// `POST /api/favorites/{product_id}/toggle`
pub async fn toggle<B: Backend>(
    State(state): State<AppState<B>>,
    OptionalUser(user): OptionalUser,
    Path(product_id): Path<ProductId>,
) -> Result<Json<ApiResponse<bool>>> {
    let favorited = state
        .store()
        .toggle_favorite(user.as_ref(), product_id)
        .await?;
    Ok(ApiResponse::with_toast(
        favorited,
        Toast::favorite_toggled(favorited),
    ))
}
