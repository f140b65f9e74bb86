//! JSON route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                                 - Liveness
//!
//! # Catalog
//! GET    /api/categories
//! GET    /api/products?category=<id>
//! GET    /api/products/{id}
//! GET    /api/products/{id}/reviews
//! POST   /api/products/{id}/reviews              - {rating, content}
//! DELETE /api/reviews/{id}
//!
//! # Cart (signed in)
//! GET    /api/cart
//! POST   /api/cart                               - {product_id, quantity}
//! PATCH  /api/cart/{item_id}                     - {quantity}
//! DELETE /api/cart/{item_id}
//!
//! # Favorites
//! GET    /api/favorites
//! GET    /api/favorites/{product_id}
//! POST   /api/favorites/{product_id}/toggle
//!
//! # Orders (signed in)
//! GET    /api/orders
//! POST   /api/orders                             - {recipient, phone, address}
//! GET    /api/orders/{id}
//! POST   /api/orders/{id}/cancel
//! GET    /api/orders/{id}/tracking
//! GET    /api/refund-requests/check/{order_id}
//! GET    /api/refund-requests/user/{user_id}
//!
//! # Notifications (signed in)
//! GET    /api/notifications
//! GET    /api/notifications/unread-count
//! PATCH  /api/notifications/read-all
//! PATCH  /api/notifications/{id}/read
//! DELETE /api/notifications/{id}
//!
//! # Auth
//! POST   /api/auth/login                         - {email, password}, rate limited
//! POST   /api/auth/logout
//! GET    /api/auth/session
//!
//! # Admin gate
//! POST   /api/admin/login                        - {username, password}, rate limited
//! POST   /api/admin/logout
//! GET    /api/admin/status
//! ```
//!
//! Success bodies are `{"data": ..., "toast": ...}`; failures are
//! `{"toast": ...}` (see `crate::error`).

pub mod admin;
pub mod auth;
pub mod cart;
pub mod favorites;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod reviews;

use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::backend::Backend;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Catalog and review routes.
pub fn catalog_routes<B: Backend>() -> Router<AppState<B>> {
    Router::new()
        .route("/categories", get(products::categories::<B>))
        .route("/products", get(products::index::<B>))
        .route("/products/{id}", get(products::show::<B>))
        .route(
            "/products/{id}/reviews",
            get(reviews::index::<B>).post(reviews::create::<B>),
        )
        .route("/reviews/{id}", delete(reviews::delete::<B>))
}

/// Cart routes.
pub fn cart_routes<B: Backend>() -> Router<AppState<B>> {
    Router::new()
        .route("/", get(cart::show::<B>).post(cart::add::<B>))
        .route(
            "/{item_id}",
            patch(cart::update::<B>).delete(cart::remove::<B>),
        )
}

/// Favorite routes.
pub fn favorite_routes<B: Backend>() -> Router<AppState<B>> {
    Router::new()
        .route("/", get(favorites::index::<B>))
        .route("/{product_id}", get(favorites::status::<B>))
        .route("/{product_id}/toggle", post(favorites::toggle::<B>))
}

/// Order, tracking and refund routes.
pub fn order_routes<B: Backend>() -> Router<AppState<B>> {
    Router::new()
        .route("/orders", get(orders::index::<B>).post(orders::create::<B>))
        .route("/orders/{id}", get(orders::show::<B>))
        .route("/orders/{id}/cancel", post(orders::cancel::<B>))
        .route("/orders/{id}/tracking", get(orders::tracking::<B>))
        .route(
            "/refund-requests/check/{order_id}",
            get(orders::refund_check::<B>),
        )
        .route(
            "/refund-requests/user/{user_id}",
            get(orders::refund_requests::<B>),
        )
}

/// Notification routes.
pub fn notification_routes<B: Backend>() -> Router<AppState<B>> {
    Router::new()
        .route("/", get(notifications::index::<B>))
        .route("/unread-count", get(notifications::unread_count::<B>))
        .route("/read-all", patch(notifications::read_all::<B>))
        .route("/{id}/read", patch(notifications::read::<B>))
        .route("/{id}", delete(notifications::delete::<B>))
}

/// Customer auth routes. Login is rate limited.
pub fn auth_routes<B: Backend>() -> Router<AppState<B>> {
    Router::new()
        .route(
            "/login",
            post(auth::login::<B>).layer(auth_rate_limiter()),
        )
        .route("/logout", post(auth::logout::<B>))
        .route("/session", get(auth::session::<B>))
}

/// Admin gate routes. Login is rate limited.
pub fn admin_routes<B: Backend>() -> Router<AppState<B>> {
    Router::new()
        .route(
            "/login",
            post(admin::login::<B>).layer(auth_rate_limiter()),
        )
        .route("/logout", post(admin::logout))
        .route("/status", get(admin::status))
}

/// All routes for the storefront.
pub fn routes<B: Backend>() -> Router<AppState<B>> {
    Router::new()
        .route("/health", get(health))
        .nest(
            "/api",
            Router::new()
                .merge(catalog_routes())
                .merge(order_routes())
                .nest("/cart", cart_routes())
                .nest("/favorites", favorite_routes())
                .nest("/notifications", notification_routes())
                .nest("/auth", auth_routes())
                .nest("/admin", admin_routes()),
        )
}

/// Liveness health check. Does not touch the backend.
async fn health() -> &'static str {
    "ok"
}
