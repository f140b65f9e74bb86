//! User-facing notices.
//!
//! Every service outcome the customer should see, success or failure, is
//! rendered as a [`Toast`]. Messages are Korean, matching the storefront UI.

use serde::Serialize;

/// Visual style of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastVariant {
    Default,
    Destructive,
}

/// A short notice shown to the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub variant: ToastVariant,
}

impl Toast {
    #[must_use]
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            variant: ToastVariant::Default,
        }
    }

    #[must_use]
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: Some(description.into()),
            variant: ToastVariant::Destructive,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn added_to_cart() -> Self {
        Self::success("장바구니에 추가되었습니다")
    }

    pub fn cart_updated() -> Self {
        Self::success("장바구니가 수정되었습니다")
    }

    pub fn removed_from_cart() -> Self {
        Self::success("장바구니에서 삭제되었습니다")
    }

    pub fn favorite_toggled(favorited: bool) -> Self {
        if favorited {
            Self::success("찜 목록에 추가되었습니다")
        } else {
            Self::success("찜 목록에서 제거되었습니다")
        }
    }

    pub fn review_created() -> Self {
        Self::success("리뷰가 등록되었습니다")
    }

    pub fn review_deleted() -> Self {
        Self::success("리뷰가 삭제되었습니다")
    }

    pub fn order_created() -> Self {
        Self::success("주문이 완료되었습니다")
    }

    pub fn order_cancelled() -> Self {
        Self::success("주문이 취소되었습니다")
    }

    pub fn all_notifications_read() -> Self {
        Self::success("모든 알림을 읽음 처리했습니다")
    }

    pub fn notification_deleted() -> Self {
        Self::success("알림이 삭제되었습니다")
    }

    pub fn signed_in(name: &str) -> Self {
        Self::success("로그인되었습니다").with_description(format!("{name}님, 환영합니다."))
    }

    pub fn signed_out() -> Self {
        Self::success("로그아웃되었습니다")
    }
}
