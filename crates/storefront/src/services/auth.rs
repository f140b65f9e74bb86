//! Customer sign-in against the backend's auth service.
//!
//! The backend session is authoritative. The storefront keeps a mirror of
//! the signed-in user in its own session store (see `crate::session`), and
//! these operations are what keeps that mirror honest.

use secrecy::SecretString;
use tracing::{info, instrument, warn};

use haneul_core::Email;

use super::{StoreError, Storefront, ValidationError};
use crate::backend::{AuthSession, Backend, BackendError};
use crate::models::User;
use crate::query::{MutationContext, MutationKind};

impl<B: Backend> Storefront<B> {
    /// Exchange email and password for a backend session.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEmail` for a malformed address, `InvalidCredentials`
    /// when the backend rejects the pair, `NotConfigured` or `Remote`.
    #[instrument(skip(self, email, password))]
    pub async fn sign_in(&self, email: &str, password: &SecretString) -> Result<AuthSession, StoreError> {
        let backend = self.backend()?;
        let email = Email::parse(email).map_err(ValidationError::from)?;

        match backend.sign_in(&email, password).await {
            Ok(session) => {
                info!(user_id = %session.user.id, "User signed in");
                Ok(session)
            }
            Err(BackendError::InvalidCredentials) => {
                warn!("Sign-in rejected");
                Err(StoreError::InvalidCredentials)
            }
            Err(err) => {
                tracing::error!(error = %err, "Sign-in failed");
                Err(err.into())
            }
        }
    }

    /// The user behind `access_token`, or `None` once the backend has
    /// dropped the session.
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` or `Remote`.
    #[instrument(skip_all)]
    pub async fn restore(&self, access_token: &str) -> Result<Option<User>, StoreError> {
        let backend = self.backend()?;
        backend.session_user(access_token).await.map_err(|err| {
            tracing::error!(error = %err, "Session check failed");
            StoreError::from(err)
        })
    }

    /// End the backend session and drop every cached read of the user.
    ///
    /// The backend call is best effort: a failure is logged and the local
    /// sign-out still happens.
    #[instrument(skip(self, user, access_token), fields(user_id = %user.id))]
    pub async fn sign_out(&self, user: &User, access_token: &str) {
        if let Ok(backend) = self.backend()
            && let Err(err) = backend.sign_out(access_token).await
        {
            warn!(error = %err, "Backend sign-out failed");
        }
        self.complete(MutationKind::SignOut, MutationContext::user(user.id))
            .await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::query::QueryKey;
    use crate::services::testing::{storefront, unconfigured, user};

    #[tokio::test]
    async fn test_sign_in_restore_sign_out() {
        let (store, backend) = storefront();
        let account = user();
        backend.add_account("haneul@example.com", "correct horse", account.clone());

        let session = store
            .sign_in(" Haneul@Example.com ", &SecretString::from("correct horse"))
            .await
            .unwrap();
        assert_eq!(session.user, account);

        let restored = store.restore(&session.access_token).await.unwrap();
        assert_eq!(restored, Some(account.clone()));

        store.unread_count(&account).await.unwrap();
        assert!(store.cache().contains(&QueryKey::UnreadCount(account.id)).await);

        store.sign_out(&account, &session.access_token).await;
        assert!(!store.cache().contains(&QueryKey::UnreadCount(account.id)).await);
        assert_eq!(store.restore(&session.access_token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let (store, backend) = storefront();
        backend.add_account("haneul@example.com", "correct horse", user());

        let err = store
            .sign_in("haneul@example.com", &SecretString::from("battery staple"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_malformed_email_skips_backend() {
        let (store, backend) = storefront();
        let err = store
            .sign_in("not-an-email", &SecretString::from("x"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::InvalidEmail(_))
        ));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_sign_in() {
        let err = unconfigured()
            .sign_in("haneul@example.com", &SecretString::from("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotConfigured));
    }
}
