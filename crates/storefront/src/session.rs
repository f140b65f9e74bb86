//! Per-visitor session context.
//!
//! The storefront mirrors the backend session in its own cookie session: the
//! signed-in user and the bearer token that proves it. Handlers receive a
//! [`SessionContext`] and pass the user down to the services explicitly.

use axum::{extract::FromRequestParts, http::request::Parts};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, warn};

use crate::backend::Backend;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::models::User;
use crate::services::{StoreError, Storefront, Toast};

/// Session keys.
pub mod keys {
    /// The signed-in customer and their backend token.
    pub const CURRENT_USER: &str = "current_user";
    /// Set once the admin gate has been passed.
    pub const ADMIN: &str = "admin";
}

/// What the cookie session remembers about a signed-in customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub user: User,
    pub access_token: String,
}

/// Result of a login attempt.
#[derive(Debug)]
pub enum LoginOutcome {
    SignedIn(User),
    /// The backend (or local validation) refused; the session is untouched.
    Rejected(StoreError),
}

impl LoginOutcome {
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn(_))
    }

    #[must_use]
    pub fn toast(&self) -> Toast {
        match self {
            Self::SignedIn(user) => Toast::signed_in(&user.name),
            Self::Rejected(err) => err.toast(),
        }
    }
}

/// The visitor's session plus its decoded customer mirror.
#[derive(Debug, Clone)]
pub struct SessionContext {
    session: Session,
    current: Option<StoredSession>,
}

impl SessionContext {
    /// Decode the customer mirror from `session`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session store fails.
    pub async fn load(session: Session) -> Result<Self, AppError> {
        let current = session.get::<StoredSession>(keys::CURRENT_USER).await?;
        Ok(Self { session, current })
    }

    /// The signed-in customer, if any.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.current.as_ref().map(|stored| &stored.user)
    }

    /// Exchange credentials for a backend session and remember it.
    ///
    /// On rejection the previous state, signed in or not, is kept.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session store fails.
    pub async fn login<B: Backend>(
        &mut self,
        store: &Storefront<B>,
        email: &str,
        password: &SecretString,
    ) -> Result<LoginOutcome, AppError> {
        let auth = match store.sign_in(email, password).await {
            Ok(auth) => auth,
            Err(err) => return Ok(LoginOutcome::Rejected(err)),
        };

        let stored = StoredSession {
            user: auth.user,
            access_token: auth.access_token,
        };
        self.session.cycle_id().await?;
        self.session.insert(keys::CURRENT_USER, &stored).await?;
        set_sentry_user(&stored.user.id, Some(&stored.user.email));

        let user = stored.user.clone();
        self.current = Some(stored);
        Ok(LoginOutcome::SignedIn(user))
    }

    /// Re-check the remembered token with the backend.
    ///
    /// A live token refreshes the mirrored user; a rejected one clears it.
    ///
    /// # Errors
    ///
    /// Returns `Store` if the backend check fails and `Session` if the
    /// session store does.
    pub async fn restore<B: Backend>(
        &mut self,
        store: &Storefront<B>,
    ) -> Result<Option<User>, AppError> {
        let Some(stored) = self.current.as_mut() else {
            return Ok(None);
        };

        if let Some(user) = store.restore(&stored.access_token).await? {
            stored.user = user.clone();
            self.session.insert(keys::CURRENT_USER, &*stored).await?;
            set_sentry_user(&user.id, Some(&user.email));
            return Ok(Some(user));
        }

        info!(user_id = %stored.user.id, "Backend session expired; clearing mirror");
        self.forget().await?;
        Ok(None)
    }

    /// Sign out of the backend and forget the customer.
    ///
    /// Returns whether anyone was signed in.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session store fails.
    pub async fn logout<B: Backend>(&mut self, store: &Storefront<B>) -> Result<bool, AppError> {
        let Some(stored) = self.current.clone() else {
            return Ok(false);
        };

        store.sign_out(&stored.user, &stored.access_token).await;
        self.forget().await?;
        Ok(true)
    }

    async fn forget(&mut self) -> Result<(), AppError> {
        self.session.remove::<StoredSession>(keys::CURRENT_USER).await?;
        self.current = None;
        clear_sentry_user();
        Ok(())
    }

    /// Whether the admin gate has been passed in this session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session store fails.
    pub async fn is_admin(&self) -> Result<bool, AppError> {
        Ok(self
            .session
            .get::<bool>(keys::ADMIN)
            .await?
            .unwrap_or(false))
    }

    /// Set or clear the admin flag.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session store fails.
    pub async fn set_admin(&self, admin: bool) -> Result<(), AppError> {
        if admin {
            self.session.cycle_id().await?;
            self.session.insert(keys::ADMIN, true).await?;
        } else {
            self.session.remove::<bool>(keys::ADMIN).await?;
        }
        Ok(())
    }
}

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts.extensions.get::<Session>().cloned().ok_or_else(|| {
            warn!("Session layer missing from router");
            AppError::Internal("session layer missing".to_string())
        })?;
        Self::load(session).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;
    use crate::backend::MemoryBackend;
    use crate::services::testing::{storefront, user};

    async fn context() -> SessionContext {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        SessionContext::load(session).await.unwrap()
    }

    fn account(backend: &MemoryBackend) -> User {
        let account = user();
        backend.add_account("haneul@example.com", "correct horse", account.clone());
        account
    }

    #[tokio::test]
    async fn test_login_then_logout() {
        let (store, backend) = storefront();
        let account = account(&backend);
        let mut ctx = context().await;

        let outcome = ctx
            .login(&store, "haneul@example.com", &SecretString::from("correct horse"))
            .await
            .unwrap();
        assert!(outcome.is_signed_in());
        assert_eq!(ctx.user(), Some(&account));

        assert!(ctx.logout(&store).await.unwrap());
        assert_eq!(ctx.user(), None);
        assert!(!ctx.logout(&store).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_login_keeps_previous_user() {
        let (store, backend) = storefront();
        let account = account(&backend);
        let mut ctx = context().await;
        ctx.login(&store, "haneul@example.com", &SecretString::from("correct horse"))
            .await
            .unwrap();

        let outcome = ctx
            .login(&store, "haneul@example.com", &SecretString::from("wrong"))
            .await
            .unwrap();
        assert!(!outcome.is_signed_in());
        assert_eq!(outcome.toast().title, "로그인에 실패했습니다");
        assert_eq!(ctx.user(), Some(&account));
    }

    #[tokio::test]
    async fn test_restore_clears_revoked_token() {
        let (store, backend) = storefront();
        account(&backend);
        let mut ctx = context().await;
        ctx.login(&store, "haneul@example.com", &SecretString::from("correct horse"))
            .await
            .unwrap();

        assert!(ctx.restore(&store).await.unwrap().is_some());

        let token = ctx.current.as_ref().unwrap().access_token.clone();
        backend.sign_out(&token).await.unwrap();
        assert_eq!(ctx.restore(&store).await.unwrap(), None);
        assert_eq!(ctx.user(), None);
    }

    #[tokio::test]
    async fn test_admin_flag() {
        let ctx = context().await;
        assert!(!ctx.is_admin().await.unwrap());
        ctx.set_admin(true).await.unwrap();
        assert!(ctx.is_admin().await.unwrap());
        ctx.set_admin(false).await.unwrap();
        assert!(!ctx.is_admin().await.unwrap());
    }
}
