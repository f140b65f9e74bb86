//! Orders and their line items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use haneul_core::{OrderId, OrderItemId, OrderStatus, Price, ProductId, UserId};

use super::Row;

/// An order (`orders` table). `items` is filled from `order_items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_amount: Price,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

impl Row for Order {
    const TABLE: &'static str = "orders";
}

/// One product line of an order (`order_items` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price at the time of purchase.
    pub price: Price,
}

impl Row for OrderItem {
    const TABLE: &'static str = "order_items";
}

/// Delivery details entered at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub recipient: String,
    pub phone: String,
    pub address: String,
}

/// Insert payload for [`Order`].
#[derive(Debug, Clone, Serialize)]
pub struct NewOrder {
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_amount: Price,
    pub recipient: String,
    pub phone: String,
    pub address: String,
}

/// Insert payload for [`OrderItem`].
#[derive(Debug, Clone, Serialize)]
pub struct NewOrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Price,
}
