//! Service error types.

use std::sync::Arc;

use thiserror::Error;

use haneul_core::{EmailError, RatingError};

use super::toast::Toast;
use crate::backend::BackendError;
use crate::query::MutationKind;

/// A guard check rejected the input. Nothing was sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("product is out of stock")]
    OutOfStock,

    #[error("product is not for sale")]
    Unavailable,

    #[error("requested {requested} but only {available} left")]
    InsufficientStock { requested: u32, available: u32 },

    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error(transparent)]
    InvalidRating(#[from] RatingError),

    #[error("review content is empty")]
    EmptyReview,

    #[error("product was never purchased")]
    NotPurchased,

    #[error("product already reviewed")]
    AlreadyReviewed,

    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("cart is empty")]
    EmptyCart,

    #[error("order can no longer be cancelled")]
    NotCancellable,
}

/// Errors returned by storefront services.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No signed-in user.
    #[error("authentication required")]
    AuthRequired,

    /// Sign-in rejected by the auth service.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No backend URL/key in the environment.
    #[error("backend not configured")]
    NotConfigured,

    #[error("backend error: {0}")]
    Remote(Arc<BackendError>),

    /// The same mutation is still in flight.
    #[error("{0} already in progress")]
    Pending(MutationKind),

    #[error("not found")]
    NotFound,

    /// The row belongs to another user.
    #[error("forbidden")]
    Forbidden,
}

impl From<BackendError> for StoreError {
    fn from(err: BackendError) -> Self {
        Self::Remote(Arc::new(err))
    }
}

impl From<Arc<BackendError>> for StoreError {
    fn from(err: Arc<BackendError>) -> Self {
        Self::Remote(err)
    }
}

impl StoreError {
    /// Whether this is a server-side failure rather than a rejected request.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// The notice shown to the customer. Remote details are never exposed.
    #[must_use]
    pub fn toast(&self) -> Toast {
        match self {
            Self::Validation(err) => err.toast(),
            Self::AuthRequired => Toast::error("로그인이 필요합니다", "로그인 후 이용해주세요."),
            Self::InvalidCredentials => {
                Toast::error("로그인에 실패했습니다", "이메일 또는 비밀번호를 확인해주세요.")
            }
            Self::NotConfigured => {
                Toast::error("서비스 준비 중입니다", "잠시 후 다시 이용해주세요.")
            }
            Self::Remote(_) => Toast::error("오류가 발생했습니다", "잠시 후 다시 시도해주세요."),
            Self::Pending(_) => Toast::error("처리 중입니다", "이전 요청이 끝날 때까지 기다려주세요."),
            Self::NotFound => Toast::error("찾을 수 없습니다", "요청하신 정보가 존재하지 않습니다."),
            Self::Forbidden => Toast::error("권한이 없습니다", "본인의 정보만 변경할 수 있습니다."),
        }
    }
}

impl ValidationError {
    #[must_use]
    pub fn toast(&self) -> Toast {
        match self {
            Self::OutOfStock => Toast::error("품절된 상품입니다", "재입고 후 다시 시도해주세요."),
            Self::Unavailable => {
                Toast::error("판매 중인 상품이 아닙니다", "현재 구매할 수 없는 상품입니다.")
            }
            Self::InsufficientStock {
                requested,
                available,
            } => Toast::error(
                "재고가 부족합니다",
                format!("요청하신 수량({requested}개)이 남은 재고({available}개)보다 많습니다."),
            ),
            Self::InvalidQuantity => {
                Toast::error("수량을 확인해주세요", "수량은 1개 이상이어야 합니다")
            }
            Self::InvalidRating(_) => {
                Toast::error("별점을 확인해주세요", "별점은 1점에서 5점 사이여야 합니다")
            }
            Self::EmptyReview => Toast::error("리뷰 내용을 입력해주세요", "내용이 비어 있습니다."),
            Self::NotPurchased => Toast::error(
                "리뷰를 작성할 수 없습니다",
                "구매한 상품만 리뷰를 작성할 수 있습니다",
            ),
            Self::AlreadyReviewed => Toast::error(
                "이미 리뷰를 작성하셨습니다",
                "상품당 하나의 리뷰만 작성할 수 있습니다.",
            ),
            Self::InvalidEmail(_) => {
                Toast::error("이메일을 확인해주세요", "올바른 이메일 주소를 입력해주세요.")
            }
            Self::EmptyCart => Toast::error("장바구니가 비어 있습니다", "상품을 먼저 담아주세요."),
            Self::NotCancellable => Toast::error(
                "취소할 수 없는 주문입니다",
                "배송이 시작된 주문은 취소할 수 없습니다.",
            ),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use haneul_core::Rating;

    use super::*;
    use crate::services::toast::ToastVariant;

    #[test]
    fn test_insufficient_stock_toast_names_both_numbers() {
        let toast = StoreError::from(ValidationError::InsufficientStock {
            requested: 3,
            available: 2,
        })
        .toast();

        assert_eq!(toast.title, "재고가 부족합니다");
        let description = toast.description.unwrap();
        assert!(description.contains('3'));
        assert!(description.contains('2'));
        assert_eq!(toast.variant, ToastVariant::Destructive);
    }

    #[test]
    fn test_remote_toast_hides_details() {
        let err = StoreError::from(BackendError::Status {
            status: 500,
            message: "relation \"reviews\" does not exist".to_string(),
        });
        let toast = err.toast();
        assert_eq!(toast.title, "오류가 발생했습니다");
        assert!(!toast.description.unwrap().contains("relation"));
        assert!(err.is_remote());
    }

    #[test]
    fn test_rating_error_toast() {
        let err = ValidationError::from(Rating::new(7).unwrap_err());
        assert_eq!(
            err.toast().description.as_deref(),
            Some("별점은 1점에서 5점 사이여야 합니다")
        );
    }

    #[test]
    fn test_auth_required_toast() {
        assert_eq!(StoreError::AuthRequired.toast().title, "로그인이 필요합니다");
    }
}
