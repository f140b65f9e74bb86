//! Application state shared across handlers.

use std::sync::Arc;

use tracing::warn;

use crate::backend::{Backend, BackendError, RestClient};
use crate::config::StorefrontConfig;
use crate::query::GraphError;
use crate::services::{AdminGate, Storefront};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("backend client: {0}")]
    Backend(#[from] BackendError),
    #[error("invalidation graph: {0}")]
    Graph(#[from] GraphError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Generic over the backend so the router can be
/// exercised against the in-memory backend.
pub struct AppState<B = RestClient> {
    inner: Arc<AppStateInner<B>>,
}

struct AppStateInner<B> {
    config: StorefrontConfig,
    store: Storefront<B>,
    admin: AdminGate,
}

impl<B> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl AppState<RestClient> {
    /// Build the production state: a REST client when the backend is
    /// configured, nothing otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or the invalidation graph cannot
    /// be built.
    pub fn from_config(config: StorefrontConfig) -> Result<Self, StateError> {
        let backend = config.backend.as_ref().map(RestClient::new).transpose()?;
        if backend.is_none() {
            warn!("BACKEND_URL / BACKEND_API_KEY not set; guarded operations will be refused");
        }
        Self::new(config, backend)
    }
}

impl<B: Backend> AppState<B> {
    /// Create the state around an optional backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the invalidation graph fails validation.
    pub fn new(config: StorefrontConfig, backend: Option<B>) -> Result<Self, StateError> {
        let store = Storefront::new(backend, &config.cache)?;
        let admin = AdminGate::new(config.admin.clone());
        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                admin,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &Storefront<B> {
        &self.inner.store
    }

    #[must_use]
    pub fn admin(&self) -> &AdminGate {
        &self.inner.admin
    }
}
