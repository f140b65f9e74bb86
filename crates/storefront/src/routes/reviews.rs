//! Review route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use haneul_core::{ProductId, ReviewId};

use crate::backend::Backend;
use crate::error::{ApiResponse, Result};
use crate::middleware::{OptionalUser, RequireUser};
use crate::models::Review;
use crate::services::Toast;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub rating: i32,
    pub content: String,
}

/// `GET /api/products/{id}/reviews`
pub async fn index<B: Backend>(
    State(state): State<AppState<B>>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<ApiResponse<Vec<Review>>>> {
    let reviews = state.store().product_reviews(product_id).await?;
    Ok(ApiResponse::data(reviews))
}

/// `POST /api/products/{id}/reviews`
pub async fn create<B: Backend>(
    State(state): State<AppState<B>>,
    OptionalUser(user): OptionalUser,
    Path(product_id): Path<ProductId>,
    Json(form): Json<ReviewForm>,
) -> Result<Json<ApiResponse<Review>>> {
    let review = state
        .store()
        .create_review(user.as_ref(), product_id, form.rating, &form.content)
        .await?;
    Ok(ApiResponse::with_toast(review, Toast::review_created()))
}

/// `DELETE /api/reviews/{id}`
pub async fn delete<B: Backend>(
    State(state): State<AppState<B>>,
    RequireUser(user): RequireUser,
    Path(review_id): Path<ReviewId>,
) -> Result<Json<ApiResponse<()>>> {
    state.store().delete_review(&user, review_id).await?;
    Ok(ApiResponse::with_toast((), Toast::review_deleted()))
}
