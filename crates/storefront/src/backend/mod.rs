//! Client for the managed backend (auth service + relational table API).
//!
//! # Architecture
//!
//! - The backend owns every entity; the storefront keeps no durable state
//! - [`Backend`] is the seam: table-style reads/writes plus session calls
//! - [`RestClient`] talks to the hosted backend over HTTP (`reqwest`)
//! - `MemoryBackend` (tests and the `test-util` feature) keeps rows in memory
//!   and records every call
//!
//! # Example
//!
//! ```rust,ignore
//! use haneul_storefront::backend::{Backend, Filter, RestClient};
//! use haneul_storefront::models::Product;
//!
//! let client = RestClient::new(&config.backend.unwrap())?;
//! let products: Vec<Product> = client
//!     .select(&Filter::new().eq("is_available", true).order_desc("created_at"))
//!     .await?;
//! ```

#[cfg(any(test, feature = "test-util"))]
pub mod memory;
mod rest;

#[cfg(any(test, feature = "test-util"))]
pub use memory::MemoryBackend;
pub use rest::RestClient;

use std::fmt::Display;
use std::future::Future;

use secrecy::SecretString;
use serde::Serialize;
use thiserror::Error;

use haneul_core::Email;

use crate::models::{Row, User};

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body (truncated).
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Rate limited by the backend.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Email/password rejected by the auth service.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A write returned no row.
    #[error("not found: {0}")]
    NotFound(String),
}

/// A signed-in backend session.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Bearer token identifying the session.
    pub access_token: String,
    /// The user the session belongs to.
    pub user: User,
}

/// One condition of a [`Filter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `column = value`
    Eq(String, String),
    /// `column IN (values)`
    In(String, Vec<String>),
}

/// Row filter, ordering and limit for table operations.
///
/// Values are carried as strings, the way the table API receives them in the
/// query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub conditions: Vec<Condition>,
    /// `(column, descending)`
    pub order: Option<(String, bool)>,
    pub limit: Option<usize>,
}

impl Filter {
    /// A filter matching every row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `column = value`.
    #[must_use]
    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.conditions
            .push(Condition::Eq(column.to_string(), value.to_string()));
        self
    }

    /// Require `column` to be one of `values`.
    #[must_use]
    pub fn is_in<V: Display>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.conditions.push(Condition::In(
            column.to_string(),
            values.into_iter().map(|v| v.to_string()).collect(),
        ));
        self
    }

    /// Order by `column`, ascending.
    #[must_use]
    pub fn order_asc(mut self, column: &str) -> Self {
        self.order = Some((column.to_string(), false));
        self
    }

    /// Order by `column`, descending.
    #[must_use]
    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some((column.to_string(), true));
        self
    }

    /// Return at most `limit` rows.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query-string pairs in the table API's operator syntax.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        for condition in &self.conditions {
            match condition {
                Condition::Eq(column, value) => pairs.push((column.clone(), format!("eq.{value}"))),
                Condition::In(column, values) => {
                    pairs.push((column.clone(), format!("in.({})", values.join(","))));
                }
            }
        }
        if let Some((column, descending)) = &self.order {
            let direction = if *descending { "desc" } else { "asc" };
            pairs.push(("order".to_string(), format!("{column}.{direction}")));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}

/// Operations the storefront needs from the managed backend.
///
/// Every method is a single round trip. Implementations must not retry.
pub trait Backend: Send + Sync + 'static {
    /// Read rows of `T`'s table matching `filter`.
    fn select<T: Row>(
        &self,
        filter: &Filter,
    ) -> impl Future<Output = Result<Vec<T>, BackendError>> + Send;

    /// Insert one row and return it as stored.
    fn insert<T: Row, N: Serialize + Sync>(
        &self,
        row: &N,
    ) -> impl Future<Output = Result<T, BackendError>> + Send;

    /// Insert several rows in one request.
    fn insert_many<T: Row, N: Serialize + Sync>(
        &self,
        rows: &[N],
    ) -> impl Future<Output = Result<Vec<T>, BackendError>> + Send;

    /// Apply `patch` to every row matching `filter`; returns updated rows.
    fn update<T: Row, P: Serialize + Sync>(
        &self,
        filter: &Filter,
        patch: &P,
    ) -> impl Future<Output = Result<Vec<T>, BackendError>> + Send;

    /// Delete rows matching `filter`; returns how many were removed.
    fn delete<T: Row>(&self, filter: &Filter)
    -> impl Future<Output = Result<usize, BackendError>> + Send;

    /// Exchange email and password for a session.
    fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> impl Future<Output = Result<AuthSession, BackendError>> + Send;

    /// The user owning `access_token`, or `None` if the session is gone.
    fn session_user(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<Option<User>, BackendError>> + Send;

    /// End the session owning `access_token`.
    fn sign_out(&self, access_token: &str)
    -> impl Future<Output = Result<(), BackendError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs() {
        let filter = Filter::new()
            .eq("user_id", "u1")
            .is_in("order_id", ["a", "b"])
            .order_desc("created_at")
            .limit(1);

        assert_eq!(
            filter.query_pairs(),
            vec![
                ("select".to_string(), "*".to_string()),
                ("user_id".to_string(), "eq.u1".to_string()),
                ("order_id".to_string(), "in.(a,b)".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
                ("limit".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_bool_values_render_lowercase() {
        let filter = Filter::new().eq("is_read", false);
        assert_eq!(
            filter.conditions,
            vec![Condition::Eq("is_read".to_string(), "false".to_string())]
        );
    }

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::Status {
            status: 409,
            message: "duplicate key".to_string(),
        };
        assert_eq!(err.to_string(), "backend returned 409: duplicate key");
    }
}
