//! Storefront business logic.
//!
//! [`Storefront`] is the single entry point. Each submodule adds the
//! operations for one entity:
//!
//! - `products` - catalog and categories
//! - `cart` - cart lines (add is guarded)
//! - `favorites` - favorite membership
//! - `reviews` - product reviews (submit is guarded)
//! - `orders` - checkout, order history, cancellation
//! - `notifications` - inbox and read state
//! - `delivery` - shipment tracking
//! - `refunds` - refund request status
//! - `auth` - backend sign-in / session restore / sign-out
//! - `admin` - admin gate credentials
//!
//! Reads go through the [`QueryCache`]. Writes claim a [`MutationGate`] slot,
//! call the backend once, and on success log, leave a breadcrumb and
//! invalidate the mutation's declared set before returning. A failed write
//! leaves the cache as it was.

pub mod admin;
pub mod auth;
mod cart;
mod delivery;
mod error;
mod favorites;
pub mod guards;
mod notifications;
mod orders;
mod products;
mod refunds;
mod reviews;
pub mod toast;

pub use admin::AdminGate;
pub use error::{StoreError, ValidationError};
pub use toast::{Toast, ToastVariant};

use std::future::Future;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::backend::{Backend, BackendError};
use crate::config::CacheConfig;
use crate::error::add_breadcrumb;
use crate::models::User;
use crate::query::{
    Cacheable, GraphError, InvalidationGraph, MutationContext, MutationGuard, MutationKind,
    MutationGate, QueryCache, QueryKey,
};

/// Storefront services over a backend `B`.
///
/// Cheap to clone; clones share the cache and the mutation gate.
pub struct Storefront<B> {
    inner: Arc<StorefrontInner<B>>,
}

struct StorefrontInner<B> {
    backend: Option<B>,
    cache: QueryCache,
    gate: MutationGate,
    graph: InvalidationGraph,
}

impl<B> Clone for Storefront<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: Backend> Storefront<B> {
    /// Create the services. `backend` is `None` when the environment carries
    /// no backend credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the invalidation table has a broken rule.
    pub fn new(backend: Option<B>, cache: &CacheConfig) -> Result<Self, GraphError> {
        let graph = InvalidationGraph::validated()?;
        Ok(Self {
            inner: Arc::new(StorefrontInner {
                backend,
                cache: QueryCache::new(cache),
                gate: MutationGate::new(),
                graph,
            }),
        })
    }

    /// Whether a backend is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.inner.backend.is_some()
    }

    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.inner.cache
    }

    fn backend(&self) -> Result<&B, StoreError> {
        self.inner.backend.as_ref().ok_or(StoreError::NotConfigured)
    }

    /// Cached read of `key`.
    async fn read<'a, T, F, Fut>(&'a self, key: QueryKey, load: F) -> Result<T, StoreError>
    where
        T: Cacheable,
        F: Fn(&'a B) -> Fut,
        Fut: Future<Output = Result<T, BackendError>> + 'a,
    {
        let backend = self.backend()?;
        self.inner
            .cache
            .get_or_load(key, || load(backend))
            .await
            .map_err(|err| {
                error!(error = %err, "Backend read failed");
                StoreError::Remote(err)
            })
    }

    /// Claim the gate slot for `kind` and return the backend to write to.
    fn begin(&self, kind: MutationKind, user: &User) -> Result<(MutationGuard, &B), StoreError> {
        let backend = self.backend()?;
        let guard = self.inner.gate.begin(kind, Some(user.id)).map_err(|kind| {
            warn!(%kind, user_id = %user.id, "Mutation already pending");
            StoreError::Pending(kind)
        })?;
        Ok((guard, backend))
    }

    /// Success step of a mutation: log, breadcrumb, then invalidate.
    async fn complete(&self, kind: MutationKind, ctx: MutationContext) {
        info!(%kind, user_id = ?ctx.user, product_id = ?ctx.product, order_id = ?ctx.order, "Mutation succeeded");
        add_breadcrumb("mutation", &kind.to_string(), None);
        self.inner
            .cache
            .invalidate(&self.inner.graph, kind, &ctx)
            .await;
    }

    /// Failure step of a mutation that may have left some of its writes
    /// behind: invalidate anyway so reads show what the backend kept.
    async fn abandon(&self, kind: MutationKind, ctx: MutationContext) {
        warn!(%kind, user_id = ?ctx.user, order_id = ?ctx.order, "Mutation abandoned after partial writes");
        self.inner
            .cache
            .invalidate(&self.inner.graph, kind, &ctx)
            .await;
    }
}

/// Log a failed write and wrap it.
fn write_failed(kind: MutationKind, err: BackendError) -> StoreError {
    error!(%kind, error = %err, "Mutation failed");
    StoreError::from(err)
}

/// The signed-in user, or `AuthRequired`.
fn require_user(session: Option<&User>) -> Result<&User, StoreError> {
    session.ok_or_else(|| {
        warn!("Rejected: not signed in");
        StoreError::AuthRequired
    })
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixtures shared by the service tests.

    use chrono::Utc;

    use haneul_core::{Price, ProductId, UserId};

    use super::Storefront;
    use crate::backend::MemoryBackend;
    use crate::config::CacheConfig;
    use crate::models::{Product, User};

    pub fn storefront() -> (Storefront<MemoryBackend>, MemoryBackend) {
        let backend = MemoryBackend::new();
        let storefront = Storefront::new(Some(backend.clone()), &CacheConfig::default())
            .unwrap_or_else(|e| panic!("invalid graph: {e}"));
        (storefront, backend)
    }

    pub fn unconfigured() -> Storefront<MemoryBackend> {
        Storefront::new(None, &CacheConfig::default()).unwrap_or_else(|e| panic!("invalid graph: {e}"))
    }

    pub fn user() -> User {
        User {
            id: UserId::random(),
            name: "김하늘".to_string(),
            email: "haneul@example.com".to_string(),
            is_admin: false,
            points: 0,
            coupons: 0,
            total_orders: 0,
            total_spent: Price::ZERO,
        }
    }

    pub fn product(price: i64, stock: Option<i32>) -> Product {
        Product {
            id: ProductId::random(),
            name: "제주 감귤".to_string(),
            name_en: Some("Jeju Tangerine".to_string()),
            description: None,
            price: Price::won(price),
            category_id: None,
            image_url: None,
            is_available: true,
            is_out_of_stock: false,
            stock,
            likes_count: 0,
            reviews_count: 0,
            created_at: Utc::now(),
        }
    }
}
