//! Customer sign-in route handlers.

use axum::{Json, extract::State};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::instrument;

use crate::backend::Backend;
use crate::error::{ApiResponse, Result};
use crate::models::User;
use crate::services::Toast;
use crate::session::{LoginOutcome, SessionContext};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// `POST /api/auth/login`
///
/// A rejected login keeps whatever session the visitor already had.
#[instrument(skip_all)]
pub async fn login<B: Backend>(
    State(state): State<AppState<B>>,
    mut ctx: SessionContext,
    Json(form): Json<LoginForm>,
) -> Result<Json<ApiResponse<User>>> {
    let password = SecretString::from(form.password);
    let outcome = ctx.login(state.store(), &form.email, &password).await?;
    let toast = outcome.toast();
    match outcome {
        LoginOutcome::SignedIn(user) => Ok(ApiResponse::with_toast(user, toast)),
        LoginOutcome::Rejected(err) => Err(err.into()),
    }
}

/// `POST /api/auth/logout`
#[instrument(skip_all)]
pub async fn logout<B: Backend>(
    State(state): State<AppState<B>>,
    mut ctx: SessionContext,
) -> Result<Json<ApiResponse<bool>>> {
    let signed_out = ctx.logout(state.store()).await?;
    Ok(ApiResponse::with_toast(signed_out, Toast::signed_out()))
}

/// `GET /api/auth/session`
///
/// Re-checks the remembered token with the backend; `data` is `null` when
/// nobody is signed in.
#[instrument(skip_all)]
pub async fn session<B: Backend>(
    State(state): State<AppState<B>>,
    mut ctx: SessionContext,
) -> Result<Json<ApiResponse<Option<User>>>> {
    let user = ctx.restore(state.store()).await?;
    Ok(ApiResponse::data(user))
}
