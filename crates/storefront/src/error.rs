//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before responding; every failure body is a JSON toast
//! the UI can show as-is.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::backend::BackendError;
use crate::services::{StoreError, Toast, ValidationError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// A storefront operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Session store read or write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    toast: Toast,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Store(err) => match err {
                StoreError::Validation(ValidationError::AlreadyReviewed)
                | StoreError::Pending(_) => StatusCode::CONFLICT,
                StoreError::Validation(_) => StatusCode::BAD_REQUEST,
                StoreError::AuthRequired | StoreError::InvalidCredentials => {
                    StatusCode::UNAUTHORIZED
                }
                StoreError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
                StoreError::Remote(remote) => match remote.as_ref() {
                    BackendError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                    _ => StatusCode::BAD_GATEWAY,
                },
                StoreError::NotFound => StatusCode::NOT_FOUND,
                StoreError::Forbidden => StatusCode::FORBIDDEN,
            },
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Toast shown for this error. Internal details never reach the client.
    #[must_use]
    pub fn toast(&self) -> Toast {
        match self {
            Self::Store(err) => err.toast(),
            Self::Session(_) | Self::Internal(_) => {
                Toast::error("오류가 발생했습니다", "잠시 후 다시 시도해주세요.")
            }
            Self::NotFound(_) => StoreError::NotFound.toast(),
            Self::Unauthorized(_) => StoreError::AuthRequired.toast(),
            Self::Forbidden(_) => StoreError::Forbidden.toast(),
            Self::BadRequest(message) => Toast::error("요청을 확인해주세요", message.clone()),
            Self::RateLimited => {
                Toast::error("요청이 너무 많습니다", "잠시 후 다시 시도해주세요.")
            }
        }
    }

    fn is_server_error(&self) -> bool {
        match self {
            Self::Store(err) => err.is_remote(),
            Self::Session(_) | Self::Internal(_) => true,
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = ErrorBody {
            toast: self.toast(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Success body: the payload plus an optional toast.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toast: Option<Toast>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Respond with data only.
    pub const fn data(data: T) -> Json<Self> {
        Json(Self { data, toast: None })
    }

    /// Respond with data and a toast.
    pub const fn with_toast(data: T, toast: Toast) -> Json<Self> {
        Json(Self {
            data,
            toast: Some(toast),
        })
    }
}

/// Set the Sentry user context.
///
/// Call this after a successful sign-in to associate errors with the user.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a user action.
///
/// Breadcrumbs appear in Sentry reports as the trail leading up to an error.
///
/// ```rust,ignore
/// add_breadcrumb("mutation", "add_to_cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
