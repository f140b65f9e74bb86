//! Cart route handlers.
//!
//! Quantities arrive as signed integers so a negative value reaches the
//! quantity guard (as zero) and gets its toast instead of a body rejection.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use haneul_core::{CartItemId, ProductId};

use crate::backend::Backend;
use crate::error::{ApiResponse, Result};
use crate::middleware::{OptionalUser, RequireUser};
use crate::models::{Cart, CartItem};
use crate::services::Toast;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: i64,
}

const fn one() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    pub quantity: i64,
}

fn quantity(raw: i64) -> u32 {
    u32::try_from(raw.max(0)).unwrap_or(u32::MAX)
}

/// `GET /api/cart`
pub async fn show<B: Backend>(
    State(state): State<AppState<B>>,
    RequireUser(user): RequireUser,
) -> Result<Json<ApiResponse<Cart>>> {
    let cart = state.store().cart(&user).await?;
    Ok(ApiResponse::data(cart))
}

/// `POST /api/cart`
pub async fn add<B: Backend>(
    State(state): State<AppState<B>>,
    OptionalUser(user): OptionalUser,
    Json(form): Json<AddToCartForm>,
) -> Result<Json<ApiResponse<CartItem>>> {
    let item = state
        .store()
        .add_to_cart(user.as_ref(), form.product_id, quantity(form.quantity))
        .await?;
    Ok(ApiResponse::with_toast(item, Toast::added_to_cart()))
}

/// `PATCH /api/cart/{item_id}`
pub async fn update<B: Backend>(
    State(state): State<AppState<B>>,
    RequireUser(user): RequireUser,
    Path(item_id): Path<CartItemId>,
    Json(form): Json<QuantityForm>,
) -> Result<Json<ApiResponse<CartItem>>> {
    let item = state
        .store()
        .update_cart_item(&user, item_id, quantity(form.quantity))
        .await?;
    Ok(ApiResponse::with_toast(item, Toast::cart_updated()))
}

/// `DELETE /api/cart/{item_id}`
pub async fn remove<B: Backend>(
    State(state): State<AppState<B>>,
    RequireUser(user): RequireUser,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<ApiResponse<()>>> {
    state.store().remove_cart_item(&user, item_id).await?;
    Ok(ApiResponse::with_toast((), Toast::removed_from_cart()))
}
