//! Status enums for orders, deliveries, refunds and notifications.
//!
//! The backend stores statuses as plain strings. Each enum here lists the
//! values the storefront understands and keeps an `Unknown` variant for
//! anything else, so a new backend value degrades to a generic badge instead
//! of a deserialization error. Display tables are exhaustive `match`es: adding
//! a variant without a rendering does not compile.

use crate::types::display::{Icon, StatusDisplay, Tone};

/// Macro to define a string-backed status enum with an `Unknown` fallback.
///
/// Generates:
/// - the enum with the listed unit variants plus `Unknown(String)`
/// - `as_str()` returning the wire string
/// - `From<String>`/`From<&str>` (never fails) and `From<Self> for String`
/// - `Serialize`/`Deserialize` through the wire string
/// - `Display` using the wire string
///
/// # Example
///
/// ```rust
/// # use haneul_core::status_enum;
/// status_enum! {
///     /// Coupon state.
///     CouponState {
///         Active => "active",
///         Used => "used",
///     }
/// }
///
/// assert_eq!(CouponState::from("used"), CouponState::Used);
/// assert_eq!(CouponState::from("expired"), CouponState::Unknown("expired".into()));
/// ```
#[macro_export]
macro_rules! status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// A value this build does not recognize.
            Unknown(String),
        }

        impl $name {
            /// Every recognized variant, in declaration order.
            pub const KNOWN: &'static [Self] = &[ $( Self::$variant ),+ ];

            /// The wire representation.
            #[must_use]
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $wire, )+
                    Self::Unknown(raw) => raw.as_str(),
                }
            }

            /// Whether this is the fallback variant.
            #[must_use]
            pub const fn is_unknown(&self) -> bool {
                matches!(self, Self::Unknown(_))
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                match raw {
                    $( $wire => Self::$variant, )+
                    other => Self::Unknown(other.to_owned()),
                }
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                match Self::from(raw.as_str()) {
                    Self::Unknown(_) => Self::Unknown(raw),
                    known => known,
                }
            }
        }

        impl From<$name> for String {
            fn from(status: $name) -> Self {
                match status {
                    $name::Unknown(raw) => raw,
                    known => known.as_str().to_owned(),
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

status_enum! {
    /// Order lifecycle status.
    OrderStatus {
        Pending => "pending",
        Processing => "processing",
        Shipped => "shipped",
        Delivered => "delivered",
        Cancelled => "cancelled",
    }
}

impl OrderStatus {
    /// Customer-facing rendering.
    #[must_use]
    pub const fn display(&self) -> StatusDisplay {
        match self {
            Self::Pending => StatusDisplay::new("주문 접수", Tone::Yellow, Icon::Clock),
            Self::Processing => StatusDisplay::new("상품 준비중", Tone::Blue, Icon::Package),
            Self::Shipped => StatusDisplay::new("배송중", Tone::Indigo, Icon::Truck),
            Self::Delivered => StatusDisplay::new("배송완료", Tone::Green, Icon::CheckCircle),
            Self::Cancelled => StatusDisplay::new("주문 취소", Tone::Red, Icon::XCircle),
            Self::Unknown(_) => StatusDisplay::UNKNOWN,
        }
    }

    /// Orders can be cancelled until they leave the warehouse.
    #[must_use]
    pub const fn is_cancellable(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }
}

status_enum! {
    /// Courier delivery status.
    ///
    /// Happy path: pending, processing, shipped or in transit, out for
    /// delivery, delivered. `Failed` and `Returned` are terminal alternates.
    DeliveryStatus {
        Pending => "pending",
        Processing => "processing",
        Shipped => "shipped",
        InTransit => "in_transit",
        OutForDelivery => "out_for_delivery",
        Delivered => "delivered",
        Failed => "failed",
        Returned => "returned",
    }
}

impl DeliveryStatus {
    /// Number of steps on the delivery timeline.
    pub const TIMELINE_STEPS: u8 = 5;

    /// Customer-facing rendering.
    #[must_use]
    pub const fn display(&self) -> StatusDisplay {
        match self {
            Self::Pending => StatusDisplay::new("배송 준비중", Tone::Gray, Icon::Clock),
            Self::Processing => StatusDisplay::new("상품 준비중", Tone::Yellow, Icon::Package),
            Self::Shipped => StatusDisplay::new("발송완료", Tone::Blue, Icon::Truck),
            Self::InTransit => StatusDisplay::new("배송중", Tone::Indigo, Icon::Truck),
            Self::OutForDelivery => StatusDisplay::new("배송 출발", Tone::Purple, Icon::MapPin),
            Self::Delivered => StatusDisplay::new("배송완료", Tone::Green, Icon::CheckCircle),
            Self::Failed => StatusDisplay::new("배송 실패", Tone::Red, Icon::AlertCircle),
            Self::Returned => StatusDisplay::new("반송", Tone::Orange, Icon::RotateCcw),
            Self::Unknown(_) => StatusDisplay::UNKNOWN,
        }
    }

    /// Position on the timeline (0-based), or `None` off the happy path.
    #[must_use]
    pub const fn progress_step(&self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Processing => Some(1),
            Self::Shipped | Self::InTransit => Some(2),
            Self::OutForDelivery => Some(3),
            Self::Delivered => Some(4),
            Self::Failed | Self::Returned | Self::Unknown(_) => None,
        }
    }

    /// No further transitions are expected.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Failed | Self::Returned)
    }
}

status_enum! {
    /// Refund request review status. Read-only in the storefront.
    RefundStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

impl RefundStatus {
    /// Customer-facing rendering.
    #[must_use]
    pub const fn display(&self) -> StatusDisplay {
        match self {
            Self::Pending => StatusDisplay::new("환불 검토중", Tone::Yellow, Icon::Clock),
            Self::Approved => StatusDisplay::new("환불 승인", Tone::Green, Icon::CheckCircle),
            Self::Rejected => StatusDisplay::new("환불 거절", Tone::Red, Icon::XCircle),
            Self::Unknown(_) => StatusDisplay::UNKNOWN,
        }
    }
}

status_enum! {
    /// What a notification is about.
    NotificationType {
        Comment => "comment",
        Like => "like",
        Order => "order",
        System => "system",
    }
}

impl NotificationType {
    /// Customer-facing rendering.
    #[must_use]
    pub const fn display(&self) -> StatusDisplay {
        match self {
            Self::Comment => StatusDisplay::new("댓글", Tone::Blue, Icon::MessageCircle),
            Self::Like => StatusDisplay::new("좋아요", Tone::Red, Icon::Heart),
            Self::Order => StatusDisplay::new("주문", Tone::Green, Icon::ShoppingBag),
            Self::System => StatusDisplay::new("공지", Tone::Gray, Icon::Bell),
            Self::Unknown(_) => StatusDisplay::new("알림", Tone::Gray, Icon::Bell),
        }
    }
}
