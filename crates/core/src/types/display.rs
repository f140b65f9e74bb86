//! Presentation metadata attached to status values.
//!
//! The browser renders a badge from a [`StatusDisplay`]: the Korean label,
//! a colour tone and an icon name. Keeping the tables here means every
//! status the backend can send has exactly one rendering.

use serde::Serialize;

/// Badge colour tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Gray,
    Yellow,
    Blue,
    Indigo,
    Purple,
    Orange,
    Green,
    Red,
}

/// Icon identifier understood by the frontend icon set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Icon {
    Clock,
    Package,
    Truck,
    MapPin,
    CheckCircle,
    XCircle,
    RotateCcw,
    AlertCircle,
    HelpCircle,
    MessageCircle,
    Heart,
    ShoppingBag,
    Bell,
}

/// How a status value is shown to the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusDisplay {
    /// Customer-facing label (Korean).
    pub label: &'static str,
    /// Badge colour.
    pub tone: Tone,
    /// Badge icon.
    pub icon: Icon,
}

impl StatusDisplay {
    /// Rendering used for any value the tables do not know.
    pub const UNKNOWN: Self = Self::new("알 수 없음", Tone::Gray, Icon::HelpCircle);

    #[must_use]
    pub const fn new(label: &'static str, tone: Tone, icon: Icon) -> Self {
        Self { label, tone, icon }
    }
}
