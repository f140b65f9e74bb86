//! Request cache for backend reads.
//!
//! A `moka` future cache keyed by [`QueryKey`]. Concurrent reads of the same
//! key share one load, entries expire after the configured TTL, and
//! mutations remove the entries their invalidation set matches.
//!
//! Each key carries an epoch. Invalidating a key retires its epoch, so a
//! read issued afterwards starts a fresh load instead of joining one that
//! began before the mutation, and a retired load is never kept.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use moka::future::Cache;
use tracing::{debug, error};

use super::{InvalidationGraph, MutationContext, MutationKind, QueryKey};
use crate::backend::BackendError;
use crate::config::CacheConfig;
use crate::models::{
    Cart, Category, FavoriteProduct, Notification, Order, Product, RefundRequest, Review,
    TrackingView,
};

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CachedValue {
    Products(Vec<Product>),
    Product(Option<Box<Product>>),
    Categories(Vec<Category>),
    Cart(Cart),
    Favorites(Vec<FavoriteProduct>),
    FavoriteStatus(bool),
    ProductReviews(Vec<Review>),
    Orders(Vec<Order>),
    Order(Option<Box<Order>>),
    Notifications(Vec<Notification>),
    UnreadCount(usize),
    DeliveryTracking(Option<Box<TrackingView>>),
    RefundCheck(Option<Box<RefundRequest>>),
    RefundRequests(Vec<RefundRequest>),
}

/// A read result that can be stored in [`CachedValue`].
pub trait Cacheable: Sized + Send + 'static {
    fn into_cached(self) -> CachedValue;
    fn from_cached(value: CachedValue) -> Option<Self>;
}

macro_rules! cacheable {
    ($ty:ty => $variant:ident) => {
        impl Cacheable for $ty {
            fn into_cached(self) -> CachedValue {
                CachedValue::$variant(self)
            }

            fn from_cached(value: CachedValue) -> Option<Self> {
                match value {
                    CachedValue::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
    (boxed $ty:ty => $variant:ident) => {
        impl Cacheable for Option<$ty> {
            fn into_cached(self) -> CachedValue {
                CachedValue::$variant(self.map(Box::new))
            }

            fn from_cached(value: CachedValue) -> Option<Self> {
                match value {
                    CachedValue::$variant(inner) => Some(inner.map(|boxed| *boxed)),
                    _ => None,
                }
            }
        }
    };
}

cacheable!(Vec<Product> => Products);
cacheable!(boxed Product => Product);
cacheable!(Vec<Category> => Categories);
cacheable!(Cart => Cart);
cacheable!(Vec<FavoriteProduct> => Favorites);
cacheable!(bool => FavoriteStatus);
cacheable!(Vec<Review> => ProductReviews);
cacheable!(Vec<Order> => Orders);
cacheable!(boxed Order => Order);
cacheable!(Vec<Notification> => Notifications);
cacheable!(usize => UnreadCount);
cacheable!(boxed TrackingView => DeliveryTracking);
cacheable!(boxed RefundRequest => RefundCheck);
cacheable!(Vec<RefundRequest> => RefundRequests);

/// A cache slot: the key plus the epoch it was loaded under.
type Slot = (QueryKey, u64);

/// Shared read cache. Clones share entries.
#[derive(Clone)]
pub struct QueryCache {
    inner: Cache<Slot, CachedValue>,
    epochs: Cache<QueryKey, u64>,
    next_epoch: Arc<AtomicU64>,
}

impl QueryCache {
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        let inner = Cache::builder()
            .max_capacity(config.capacity)
            .time_to_live(config.ttl)
            .build();
        let epochs = Cache::builder()
            .max_capacity(config.capacity)
            .time_to_live(config.ttl)
            .build();
        Self {
            inner,
            epochs,
            next_epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current epoch of `key`, assigning a never-used one if it has none.
    async fn epoch(&self, key: &QueryKey) -> u64 {
        let next = &self.next_epoch;
        self.epochs
            .get_with(key.clone(), async { next.fetch_add(1, Ordering::Relaxed) })
            .await
    }

    /// Return the cached value for `key`, or run `load` to fetch it.
    ///
    /// While a load for `key` is in flight, other callers for the same key
    /// wait for it instead of starting their own. Failed loads are not cached.
    ///
    /// # Errors
    ///
    /// Returns the loader's error, shared between every waiting caller.
    pub async fn get_or_load<T, F, Fut>(&self, key: QueryKey, load: F) -> Result<T, Arc<BackendError>>
    where
        T: Cacheable,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let epoch = self.epoch(&key).await;
        let slot = (key, epoch);
        if self.inner.contains_key(&slot) {
            debug!(key = ?slot.0, "Cache hit");
        } else {
            debug!(key = ?slot.0, "Cache miss");
        }

        let value = self
            .inner
            .try_get_with(slot.clone(), async { load().await.map(Cacheable::into_cached) })
            .await?;

        // Invalidated while loading: this caller asked first and keeps the
        // value, but nobody else may be served it.
        if self.epochs.get(&slot.0).await != Some(epoch) {
            debug!(key = ?slot.0, epoch, "Load outlived its epoch, dropping it");
            self.inner.invalidate(&slot).await;
        }

        if let Some(value) = T::from_cached(value) {
            return Ok(value);
        }

        // A key kind always maps to one value type; reaching here means an
        // entry was written under the wrong key.
        error!(key = ?slot.0, "Cached value has unexpected type, reloading");
        self.inner.invalidate(&slot).await;
        Ok(load().await?)
    }

    /// Remove every entry `mutation` marks stale for `ctx`.
    ///
    /// Epochs are retired before entries are removed, so loads still in
    /// flight for a stale key can no longer be joined or kept.
    pub async fn invalidate(&self, graph: &InvalidationGraph, mutation: MutationKind, ctx: &MutationContext) {
        let retired: Vec<Arc<QueryKey>> = self
            .epochs
            .iter()
            .filter(|(key, _)| graph.is_stale(mutation, ctx, key))
            .map(|(key, _)| key)
            .collect();
        for key in &retired {
            self.epochs.invalidate(key.as_ref()).await;
        }

        let stale: Vec<Arc<Slot>> = self
            .inner
            .iter()
            .filter(|(slot, _)| graph.is_stale(mutation, ctx, &slot.0))
            .map(|(slot, _)| slot)
            .collect();

        debug!(%mutation, retired = retired.len(), count = stale.len(), "Invalidating cached queries");
        for slot in stale {
            self.inner.invalidate(slot.as_ref()).await;
        }
    }

    /// Whether `key` currently has a fresh entry.
    pub async fn contains(&self, key: &QueryKey) -> bool {
        match self.epochs.get(key).await {
            Some(epoch) => self.inner.contains_key(&(key.clone(), epoch)),
            None => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use haneul_core::{ProductId, UserId};

    use super::*;

    fn cache() -> QueryCache {
        QueryCache::new(&CacheConfig::default())
    }

    #[tokio::test]
    async fn test_second_read_is_served_from_cache() {
        let cache = cache();
        let loads = AtomicUsize::new(0);
        let key = QueryKey::UnreadCount(UserId::random());

        for _ in 0..2 {
            let count: usize = cache
                .get_or_load(key.clone(), || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(3)
                })
                .await
                .unwrap();
            assert_eq!(count, 3);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_reads_share_one_load() {
        let cache = cache();
        let loads = AtomicUsize::new(0);
        let key = QueryKey::FavoriteStatus(UserId::random(), ProductId::random());

        let load = || async {
            loads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(true)
        };
        let (a, b) = tokio::join!(
            cache.get_or_load::<bool, _, _>(key.clone(), load),
            cache.get_or_load::<bool, _, _>(key.clone(), load),
        );

        assert!(a.unwrap() && b.unwrap());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let cache = cache();
        let key = QueryKey::Categories;

        let first = cache
            .get_or_load::<Vec<Category>, _, _>(key.clone(), || async {
                Err(BackendError::RateLimited(1))
            })
            .await;
        assert!(first.is_err());
        assert!(!cache.contains(&key).await);

        let second = cache
            .get_or_load::<Vec<Category>, _, _>(key.clone(), || async { Ok(Vec::new()) })
            .await
            .unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_removes_only_matching_entries() {
        let cache = cache();
        let graph = InvalidationGraph::validated().unwrap();
        let user = UserId::random();
        let other = UserId::random();

        for owner in [user, other] {
            cache
                .get_or_load::<usize, _, _>(QueryKey::UnreadCount(owner), || async { Ok(1) })
                .await
                .unwrap();
        }
        cache
            .get_or_load::<Vec<Category>, _, _>(QueryKey::Categories, || async { Ok(Vec::new()) })
            .await
            .unwrap();

        cache
            .invalidate(
                &graph,
                MutationKind::MarkAllNotificationsRead,
                &MutationContext::user(user),
            )
            .await;

        assert!(!cache.contains(&QueryKey::UnreadCount(user)).await);
        assert!(cache.contains(&QueryKey::UnreadCount(other)).await);
        assert!(cache.contains(&QueryKey::Categories).await);
    }

    #[tokio::test]
    async fn test_read_after_invalidation_skips_load_in_flight() {
        let cache = cache();
        let graph = InvalidationGraph::validated().unwrap();
        let user = UserId::random();
        let key = QueryKey::UnreadCount(user);

        let slow = cache.get_or_load::<usize, _, _>(key.clone(), || async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(5)
        });
        let mutate_then_read = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cache
                .invalidate(
                    &graph,
                    MutationKind::MarkAllNotificationsRead,
                    &MutationContext::user(user),
                )
                .await;
            cache
                .get_or_load::<usize, _, _>(key.clone(), || async { Ok(0) })
                .await
        };
        let (before, after) = tokio::join!(slow, mutate_then_read);

        assert_eq!(before.unwrap(), 5);
        assert_eq!(after.unwrap(), 0);

        let cached = cache
            .get_or_load::<usize, _, _>(key, || async { Ok(99) })
            .await
            .unwrap();
        assert_eq!(cached, 0);
    }

    #[tokio::test]
    async fn test_load_invalidated_midway_is_not_kept() {
        let cache = cache();
        let graph = InvalidationGraph::validated().unwrap();
        let user = UserId::random();
        let key = QueryKey::UnreadCount(user);

        let slow = cache.get_or_load::<usize, _, _>(key.clone(), || async {
            tokio::time::sleep(Duration::from_millis(40)).await;
            Ok(5)
        });
        let mutate = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cache
                .invalidate(
                    &graph,
                    MutationKind::MarkAllNotificationsRead,
                    &MutationContext::user(user),
                )
                .await;
        };
        let (before, ()) = tokio::join!(slow, mutate);
        assert_eq!(before.unwrap(), 5);

        assert!(!cache.contains(&key).await);
        let fresh = cache
            .get_or_load::<usize, _, _>(key, || async { Ok(0) })
            .await
            .unwrap();
        assert_eq!(fresh, 0);
    }
}
