//! Haneul Market storefront library.
//!
//! A JSON backend-for-frontend over a managed backend (auth plus relational
//! tables). The binary in `main.rs` wires configuration, observability and
//! the router built by [`app`]; tests build the same router over the
//! in-memory backend.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod query;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;

use axum::{Router, extract::Request, middleware::from_fn};
use tower_http::trace::TraceLayer;

use crate::backend::Backend;
use crate::state::AppState;

/// The full storefront router with its middleware stack.
pub fn app<B: Backend>(state: AppState<B>) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    routes::routes()
        .layer(session_layer)
        .layer(from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
