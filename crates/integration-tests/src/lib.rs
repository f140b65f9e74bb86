//! Integration tests for the Haneul Market storefront.
//!
//! The full router (sessions, request IDs, extractors, error bodies) is
//! driven in-process with `tower::ServiceExt::oneshot` over the recording
//! [`MemoryBackend`], so no network or database is needed:
//!
//! ```bash
//! cargo test -p haneul-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart` - add-to-cart guards and cart lifecycle
//! - `favorites` - toggle round trip and the signed-out path
//! - `reviews` - purchase and duplicate pre-checks
//! - `notifications` - read state and unread count
//! - `orders` - checkout, tracking and refund status
//! - `session` - login, restore, logout and the admin gate
//! - `cache` - read dedup and invalidation after writes

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Mutex;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;

use haneul_core::{Price, ProductId, UserId};
use haneul_storefront::backend::MemoryBackend;
use haneul_storefront::config::{AdminConfig, CacheConfig, StorefrontConfig};
use haneul_storefront::models::{Product, User};
use haneul_storefront::state::AppState;

pub use haneul_storefront::services::Storefront;

/// Password every fixture account signs in with.
pub const PASSWORD: &str = "correct horse battery";

/// A storefront configuration for tests.
#[must_use]
pub fn config(admin: Option<AdminConfig>) -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        backend: None,
        admin,
        cache: CacheConfig::default(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A customer fixture.
#[must_use]
pub fn user(name: &str, email: &str) -> User {
    User {
        id: UserId::random(),
        name: name.to_string(),
        email: email.to_string(),
        is_admin: false,
        points: 0,
        coupons: 0,
        total_orders: 0,
        total_spent: Price::ZERO,
    }
}

/// A listed product fixture.
#[must_use]
pub fn product(name: &str, price: i64, stock: Option<i32>) -> Product {
    Product {
        id: ProductId::random(),
        name: name.to_string(),
        name_en: None,
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

/// A storefront over a shared in-memory backend, for service-level tests.
#[must_use]
pub fn storefront() -> (Storefront<MemoryBackend>, MemoryBackend) {
    let backend = MemoryBackend::new();
    let store = Storefront::new(Some(backend.clone()), &CacheConfig::default()).unwrap();
    (store, backend)
}

/// A decoded response.
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

impl Reply {
    /// The toast title, if the body carries a toast.
    #[must_use]
    pub fn toast_title(&self) -> Option<&str> {
        self.body["toast"]["title"].as_str()
    }

    #[must_use]
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

/// One browser: the router plus a cookie jar holding the session cookie.
pub struct TestApp {
    router: Router,
    pub backend: MemoryBackend,
    cookie: Mutex<Option<String>>,
}

impl TestApp {
    /// A configured storefront with no admin credentials.
    #[must_use]
    pub fn new() -> Self {
        Self::with_admin(None)
    }

    #[must_use]
    pub fn with_admin(admin: Option<AdminConfig>) -> Self {
        let backend = MemoryBackend::new();
        let state = AppState::new(config(admin), Some(backend.clone())).unwrap();
        Self {
            router: haneul_storefront::app(state),
            backend,
            cookie: Mutex::new(None),
        }
    }

    /// A storefront started without backend credentials.
    #[must_use]
    pub fn unconfigured() -> Self {
        let state = AppState::<MemoryBackend>::new(config(None), None).unwrap();
        Self {
            router: haneul_storefront::app(state),
            backend: MemoryBackend::new(),
            cookie: Mutex::new(None),
        }
    }

    /// Send a request with the current session cookie and decode the JSON
    /// reply. Empty or non-JSON bodies decode as `Value::Null`.
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> Reply {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.10");
        if let Some(cookie) = self.cookie.lock().unwrap().clone() {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie
                .to_str()
                .unwrap()
                .split(';')
                .next()
                .unwrap()
                .to_string();
            *self.cookie.lock().unwrap() = Some(pair);
        }

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Reply { status, body }
    }

    pub async fn get(&self, uri: &str) -> Reply {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> Reply {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> Reply {
        self.send(Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> Reply {
        self.send(Method::DELETE, uri, None).await
    }

    /// Register `account` with the backend and sign in as it.
    pub async fn sign_in(&self, account: &User) -> Reply {
        self.backend.add_account(&account.email, PASSWORD, account.clone());
        let reply = self
            .post(
                "/api/auth/login",
                serde_json::json!({ "email": account.email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "login failed: {:?}", reply.body);
        reply
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
