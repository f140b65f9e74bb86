//! Request cache, invalidation graph and mutation gate.
//!
//! Reads are keyed by [`QueryKey`] and served from [`QueryCache`]. Writes take
//! a [`MutationGate`] slot, and on success mark their declared
//! [`Invalidation`] set stale so the next read goes back to the backend.

pub mod cache;
pub mod gate;
pub mod invalidation;

pub use cache::{CachedValue, Cacheable, QueryCache};
pub use gate::{MutationGate, MutationGuard};
pub use invalidation::{
    GraphError, Invalidation, InvalidationGraph, MutationContext, MutationKind, Scope,
};

use haneul_core::{CategoryId, OrderId, ProductId, UserId};

/// Identifies one cached read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Products { category: Option<CategoryId> },
    Product(ProductId),
    Categories,
    Cart(UserId),
    Favorites(UserId),
    FavoriteStatus(UserId, ProductId),
    ProductReviews(ProductId),
    Orders(UserId),
    Order(UserId, OrderId),
    Notifications(UserId),
    UnreadCount(UserId),
    DeliveryTracking(UserId, OrderId),
    RefundCheck(UserId, OrderId),
    RefundRequests(UserId),
}

/// [`QueryKey`] without its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Products,
    Product,
    Categories,
    Cart,
    Favorites,
    FavoriteStatus,
    ProductReviews,
    Orders,
    Order,
    Notifications,
    UnreadCount,
    DeliveryTracking,
    RefundCheck,
    RefundRequests,
}

impl QueryKind {
    /// Whether keys of this kind carry the id `scope` selects on.
    #[must_use]
    pub const fn carries(self, scope: Scope) -> bool {
        match scope {
            Scope::All => true,
            Scope::User => matches!(
                self,
                Self::Cart
                    | Self::Favorites
                    | Self::FavoriteStatus
                    | Self::Orders
                    | Self::Order
                    | Self::Notifications
                    | Self::UnreadCount
                    | Self::DeliveryTracking
                    | Self::RefundCheck
                    | Self::RefundRequests
            ),
            Scope::Product => matches!(
                self,
                Self::Product | Self::FavoriteStatus | Self::ProductReviews
            ),
            Scope::Order => matches!(
                self,
                Self::Order | Self::DeliveryTracking | Self::RefundCheck
            ),
        }
    }
}

impl QueryKey {
    #[must_use]
    pub const fn kind(&self) -> QueryKind {
        match self {
            Self::Products { .. } => QueryKind::Products,
            Self::Product(_) => QueryKind::Product,
            Self::Categories => QueryKind::Categories,
            Self::Cart(_) => QueryKind::Cart,
            Self::Favorites(_) => QueryKind::Favorites,
            Self::FavoriteStatus(..) => QueryKind::FavoriteStatus,
            Self::ProductReviews(_) => QueryKind::ProductReviews,
            Self::Orders(_) => QueryKind::Orders,
            Self::Order(..) => QueryKind::Order,
            Self::Notifications(_) => QueryKind::Notifications,
            Self::UnreadCount(_) => QueryKind::UnreadCount,
            Self::DeliveryTracking(..) => QueryKind::DeliveryTracking,
            Self::RefundCheck(..) => QueryKind::RefundCheck,
            Self::RefundRequests(_) => QueryKind::RefundRequests,
        }
    }

    /// The user this read belongs to, if any.
    #[must_use]
    pub const fn user(&self) -> Option<UserId> {
        match self {
            Self::Cart(user)
            | Self::Favorites(user)
            | Self::FavoriteStatus(user, _)
            | Self::Orders(user)
            | Self::Order(user, _)
            | Self::Notifications(user)
            | Self::UnreadCount(user)
            | Self::DeliveryTracking(user, _)
            | Self::RefundCheck(user, _)
            | Self::RefundRequests(user) => Some(*user),
            Self::Products { .. } | Self::Product(_) | Self::Categories | Self::ProductReviews(_) => {
                None
            }
        }
    }

    #[must_use]
    pub const fn product(&self) -> Option<ProductId> {
        match self {
            Self::Product(product)
            | Self::FavoriteStatus(_, product)
            | Self::ProductReviews(product) => Some(*product),
            _ => None,
        }
    }

    #[must_use]
    pub const fn order(&self) -> Option<OrderId> {
        match self {
            Self::Order(_, order) | Self::DeliveryTracking(_, order) | Self::RefundCheck(_, order) => {
                Some(*order)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_keys() -> Vec<QueryKey> {
        let user = UserId::random();
        let product = ProductId::random();
        let order = OrderId::random();
        vec![
            QueryKey::Products { category: None },
            QueryKey::Product(product),
            QueryKey::Categories,
            QueryKey::Cart(user),
            QueryKey::Favorites(user),
            QueryKey::FavoriteStatus(user, product),
            QueryKey::ProductReviews(product),
            QueryKey::Orders(user),
            QueryKey::Order(user, order),
            QueryKey::Notifications(user),
            QueryKey::UnreadCount(user),
            QueryKey::DeliveryTracking(user, order),
            QueryKey::RefundCheck(user, order),
            QueryKey::RefundRequests(user),
        ]
    }

    #[test]
    fn test_carries_agrees_with_accessors() {
        for key in sample_keys() {
            let kind = key.kind();
            assert_eq!(kind.carries(Scope::User), key.user().is_some(), "{key:?}");
            assert_eq!(kind.carries(Scope::Product), key.product().is_some(), "{key:?}");
            assert_eq!(kind.carries(Scope::Order), key.order().is_some(), "{key:?}");
        }
    }
}
