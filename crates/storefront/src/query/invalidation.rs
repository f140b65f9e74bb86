//! Which cached reads each mutation marks stale.
//!
//! The graph is a static table from [`MutationKind`] to a slice of
//! [`Invalidation`]s. [`InvalidationGraph::validated`] checks the whole table
//! once at startup; the storefront refuses to start on a broken rule.

use std::fmt;

use thiserror::Error;

use haneul_core::{OrderId, ProductId, UserId};

use super::{QueryKey, QueryKind};

/// Which keys of a [`QueryKind`] an invalidation hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Every key of the kind.
    All,
    /// Keys belonging to the mutating user.
    User,
    /// Keys about the mutated product.
    Product,
    /// Keys about the mutated order.
    Order,
}

/// One rule of an invalidation set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invalidation {
    pub kind: QueryKind,
    pub scope: Scope,
}

impl Invalidation {
    const fn new(kind: QueryKind, scope: Scope) -> Self {
        Self { kind, scope }
    }

    /// Whether `key` is stale after a mutation described by `ctx`.
    #[must_use]
    pub fn matches(&self, key: &QueryKey, ctx: &MutationContext) -> bool {
        if key.kind() != self.kind {
            return false;
        }
        match self.scope {
            Scope::All => true,
            Scope::User => ctx.user.is_some() && key.user() == ctx.user,
            Scope::Product => ctx.product.is_some() && key.product() == ctx.product,
            Scope::Order => ctx.order.is_some() && key.order() == ctx.order,
        }
    }
}

/// Every write the storefront performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    AddToCart,
    UpdateCartItem,
    RemoveCartItem,
    CreateOrder,
    CancelOrder,
    ToggleFavorite,
    CreateReview,
    DeleteReview,
    MarkNotificationRead,
    MarkAllNotificationsRead,
    DeleteNotification,
    SignOut,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AddToCart => "add_to_cart",
            Self::UpdateCartItem => "update_cart_item",
            Self::RemoveCartItem => "remove_cart_item",
            Self::CreateOrder => "create_order",
            Self::CancelOrder => "cancel_order",
            Self::ToggleFavorite => "toggle_favorite",
            Self::CreateReview => "create_review",
            Self::DeleteReview => "delete_review",
            Self::MarkNotificationRead => "mark_notification_read",
            Self::MarkAllNotificationsRead => "mark_all_notifications_read",
            Self::DeleteNotification => "delete_notification",
            Self::SignOut => "sign_out",
        };
        f.write_str(name)
    }
}

use self::Scope as S;
use super::QueryKind as Q;

const CART: &[Invalidation] = &[Invalidation::new(Q::Cart, S::User)];

const CREATE_ORDER: &[Invalidation] = &[
    Invalidation::new(Q::Orders, S::User),
    Invalidation::new(Q::Cart, S::User),
];

const CANCEL_ORDER: &[Invalidation] = &[
    Invalidation::new(Q::Orders, S::User),
    Invalidation::new(Q::Order, S::Order),
    Invalidation::new(Q::DeliveryTracking, S::Order),
];

const TOGGLE_FAVORITE: &[Invalidation] = &[
    Invalidation::new(Q::Favorites, S::User),
    Invalidation::new(Q::FavoriteStatus, S::User),
    Invalidation::new(Q::Product, S::Product),
    Invalidation::new(Q::Products, S::All),
];

const REVIEW: &[Invalidation] = &[
    Invalidation::new(Q::ProductReviews, S::Product),
    Invalidation::new(Q::Product, S::Product),
    Invalidation::new(Q::Products, S::All),
];

const NOTIFICATIONS: &[Invalidation] = &[
    Invalidation::new(Q::Notifications, S::User),
    Invalidation::new(Q::UnreadCount, S::User),
];

const SIGN_OUT: &[Invalidation] = &[
    Invalidation::new(Q::Cart, S::User),
    Invalidation::new(Q::Favorites, S::User),
    Invalidation::new(Q::FavoriteStatus, S::User),
    Invalidation::new(Q::Orders, S::User),
    Invalidation::new(Q::Order, S::User),
    Invalidation::new(Q::Notifications, S::User),
    Invalidation::new(Q::UnreadCount, S::User),
    Invalidation::new(Q::DeliveryTracking, S::User),
    Invalidation::new(Q::RefundCheck, S::User),
    Invalidation::new(Q::RefundRequests, S::User),
];

impl MutationKind {
    pub const ALL: &'static [Self] = &[
        Self::AddToCart,
        Self::UpdateCartItem,
        Self::RemoveCartItem,
        Self::CreateOrder,
        Self::CancelOrder,
        Self::ToggleFavorite,
        Self::CreateReview,
        Self::DeleteReview,
        Self::MarkNotificationRead,
        Self::MarkAllNotificationsRead,
        Self::DeleteNotification,
        Self::SignOut,
    ];

    /// Reads marked stale when this mutation succeeds.
    #[must_use]
    pub const fn invalidates(self) -> &'static [Invalidation] {
        match self {
            Self::AddToCart | Self::UpdateCartItem | Self::RemoveCartItem => CART,
            Self::CreateOrder => CREATE_ORDER,
            Self::CancelOrder => CANCEL_ORDER,
            Self::ToggleFavorite => TOGGLE_FAVORITE,
            Self::CreateReview | Self::DeleteReview => REVIEW,
            Self::MarkNotificationRead
            | Self::MarkAllNotificationsRead
            | Self::DeleteNotification => NOTIFICATIONS,
            Self::SignOut => SIGN_OUT,
        }
    }

    /// Whether the context this mutation builds always carries `scope`'s id.
    #[must_use]
    pub const fn provides(self, scope: Scope) -> bool {
        match scope {
            Scope::All | Scope::User => true,
            Scope::Product => matches!(
                self,
                Self::AddToCart | Self::ToggleFavorite | Self::CreateReview | Self::DeleteReview
            ),
            Scope::Order => matches!(self, Self::CreateOrder | Self::CancelOrder),
        }
    }
}

/// Ids identifying what a mutation touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationContext {
    pub user: Option<UserId>,
    pub product: Option<ProductId>,
    pub order: Option<OrderId>,
}

impl MutationContext {
    #[must_use]
    pub const fn user(user: UserId) -> Self {
        Self {
            user: Some(user),
            product: None,
            order: None,
        }
    }

    #[must_use]
    pub const fn with_product(mut self, product: ProductId) -> Self {
        self.product = Some(product);
        self
    }

    #[must_use]
    pub const fn with_order(mut self, order: OrderId) -> Self {
        self.order = Some(order);
        self
    }
}

/// A rule in the invalidation table that can never fire correctly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("{0} has an empty invalidation set")]
    EmptySet(MutationKind),

    #[error("{mutation} invalidates {kind:?} by {scope:?}, but those keys carry no such id")]
    ScopeNotCarried {
        mutation: MutationKind,
        kind: QueryKind,
        scope: Scope,
    },

    #[error("{mutation} invalidates by {scope:?}, but never records that id")]
    ScopeNotProvided { mutation: MutationKind, scope: Scope },
}

/// The validated mutation → invalidation table.
#[derive(Debug, Clone, Copy)]
pub struct InvalidationGraph {
    _validated: (),
}

impl InvalidationGraph {
    /// Check every rule of the table.
    ///
    /// # Errors
    ///
    /// Returns the first broken rule found.
    pub fn validated() -> Result<Self, GraphError> {
        for &mutation in MutationKind::ALL {
            let set = mutation.invalidates();
            if set.is_empty() {
                return Err(GraphError::EmptySet(mutation));
            }
            for rule in set {
                if !rule.kind.carries(rule.scope) {
                    return Err(GraphError::ScopeNotCarried {
                        mutation,
                        kind: rule.kind,
                        scope: rule.scope,
                    });
                }
                if !mutation.provides(rule.scope) {
                    return Err(GraphError::ScopeNotProvided {
                        mutation,
                        scope: rule.scope,
                    });
                }
            }
        }
        Ok(Self { _validated: () })
    }

    /// Whether `key` is stale after `mutation` touched `ctx`.
    #[must_use]
    pub fn is_stale(&self, mutation: MutationKind, ctx: &MutationContext, key: &QueryKey) -> bool {
        mutation
            .invalidates()
            .iter()
            .any(|rule| rule.matches(key, ctx))
    }
}
