//! Domain models for the storefront.
//!
//! Every model mirrors one table of the managed backend and implements
//! [`Row`] so the backend client knows which table to address. `New*` types
//! are insert payloads; the backend fills in `id` and `created_at`.

pub mod cart;
pub mod delivery;
pub mod favorite;
pub mod notification;
pub mod order;
pub mod product;
pub mod refund;
pub mod review;
pub mod user;

pub use cart::{Cart, CartItem, CartLine, NewCartItem};
pub use delivery::{DeliveryTracking, TrackingView};
pub use favorite::{Favorite, FavoriteProduct, NewFavorite};
pub use notification::Notification;
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, ShippingInfo};
pub use product::{Category, Product};
pub use refund::RefundRequest;
pub use review::{NewReview, Review};
pub use user::User;

use serde::de::DeserializeOwned;

/// A record stored in a backend table.
pub trait Row: DeserializeOwned + Send + 'static {
    /// Backend table name.
    const TABLE: &'static str;
}
