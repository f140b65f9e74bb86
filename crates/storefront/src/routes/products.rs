//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use haneul_core::{CategoryId, ProductId};

use crate::backend::Backend;
use crate::error::{ApiResponse, Result};
use crate::models::{Category, Product};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub category: Option<CategoryId>,
}

/// `GET /api/products?category=<id>`
pub async fn index<B: Backend>(
    State(state): State<AppState<B>>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ApiResponse<Vec<Product>>>> {
    let products = state.store().list_products(query.category).await?;
    Ok(ApiResponse::data(products))
}

/// `GET /api/products/{id}`
pub async fn show<B: Backend>(
    State(state): State<AppState<B>>,
    Path(id): Path<ProductId>,
) -> Result<Json<ApiResponse<Product>>> {
    let product = state.store().get_product(id).await?;
    Ok(ApiResponse::data(product))
}

/// `GET /api/categories`
pub async fn categories<B: Backend>(
    State(state): State<AppState<B>>,
) -> Result<Json<ApiResponse<Vec<Category>>>> {
    let categories = state.store().list_categories().await?;
    Ok(ApiResponse::data(categories))
}
