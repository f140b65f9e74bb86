//! Admin gate route handlers.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::backend::Backend;
use crate::error::{ApiResponse, AppError, Result};
use crate::services::Toast;
use crate::session::SessionContext;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AdminLoginForm {
    pub username: String,
    pub password: String,
}

/// `POST /api/admin/login`
#[instrument(skip_all)]
pub async fn login<B: Backend>(
    State(state): State<AppState<B>>,
    ctx: SessionContext,
    Json(form): Json<AdminLoginForm>,
) -> Result<Json<ApiResponse<bool>>> {
    if !state
        .admin()
        .verify(&form.username, &form.password)
    {
        warn!("Admin login failed");
        return Err(AppError::Unauthorized("invalid admin credentials".to_string()));
    }

    ctx.set_admin(true).await?;
    info!("Admin signed in");
    Ok(ApiResponse::with_toast(
        true,
        Toast::success("관리자로 로그인되었습니다"),
    ))
}

/// `POST /api/admin/logout`
pub async fn logout(ctx: SessionContext) -> Result<Json<ApiResponse<bool>>> {
    ctx.set_admin(false).await?;
    Ok(ApiResponse::with_toast(
        false,
        Toast::success("관리자 로그아웃되었습니다"),
    ))
}

/// `GET /api/admin/status`
pub async fn status(ctx: SessionContext) -> Result<Json<ApiResponse<bool>>> {
    Ok(ApiResponse::data(ctx.is_admin().await?))
}
