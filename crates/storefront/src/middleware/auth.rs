//! Authentication extractors.
//!
//! Both read the session mirror through [`SessionContext`]; none of them
//! calls the backend. `GET /api/auth/session` is where the mirror is
//! re-checked.

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::debug;

use crate::error::AppError;
use crate::models::User;
use crate::services::StoreError;
use crate::session::SessionContext;

/// Extractor that requires a signed-in customer.
///
/// Rejects with the login toast (401) when nobody is signed in.
///
/// ```rust,ignore
/// async fn cart(State(state): State<AppState>, RequireUser(user): RequireUser) -> ... {
///     state.store().cart(&user).await
/// }
/// ```
pub struct RequireUser(pub User);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = SessionContext::from_request_parts(parts, state).await?;
        match ctx.user() {
            Some(user) => Ok(Self(user.clone())),
            None => {
                debug!(path = %parts.uri.path(), "Signed-in route hit without session");
                Err(StoreError::AuthRequired.into())
            }
        }
    }
}

/// Extractor that optionally gets the signed-in customer.
///
/// Used by the guarded mutations, which make the sign-in check themselves so
/// it is ordered with their other guards.
pub struct OptionalUser(pub Option<User>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = SessionContext::from_request_parts(parts, state).await?;
        Ok(Self(ctx.user().cloned()))
    }
}
