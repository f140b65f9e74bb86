//! Cart rows and the assembled cart view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use haneul_core::{CartItemId, Price, ProductId, UserId};

use super::{Product, Row};

/// One product in a user's cart (`cart_items` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
}

impl Row for CartItem {
    const TABLE: &'static str = "cart_items";
}

/// Insert payload for [`CartItem`].
#[derive(Debug, Clone, Serialize)]
pub struct NewCartItem {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A cart item joined with its product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub item: CartItem,
    pub product: Product,
    pub line_total: Price,
}

impl CartLine {
    #[must_use]
    pub fn new(item: CartItem, product: Product) -> Self {
        let line_total = product.price * item.quantity;
        Self {
            item,
            product,
            line_total,
        }
    }
}

/// A user's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
    pub subtotal: Price,
    pub item_count: u32,
}

impl Cart {
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let subtotal = lines.iter().map(|line| line.line_total).sum();
        let item_count = lines.iter().map(|line| line.item.quantity).sum();
        Self {
            lines,
            subtotal,
            item_count,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Quantity of `product` already in the cart.
    #[must_use]
    pub fn quantity_of(&self, product: ProductId) -> u32 {
        self.lines
            .iter()
            .filter(|line| line.item.product_id == product)
            .map(|line| line.item.quantity)
            .sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(price: i64) -> Product {
        Product {
            id: ProductId::random(),
            name: "유기농 현미".to_string(),
            name_en: None,
            description: None,
            price: Price::won(price),
            category_id: None,
            image_url: None,
            is_available: true,
            is_out_of_stock: false,
            stock: None,
            likes_count: 0,
            reviews_count: 0,
            created_at: Utc::now(),
        }
    }

    fn line(price: i64, quantity: u32) -> CartLine {
        let product = product(price);
        let item = CartItem {
            id: CartItemId::random(),
            user_id: UserId::random(),
            product_id: product.id,
            quantity,
            created_at: Utc::now(),
        };
        CartLine::new(item, product)
    }

    #[test]
    fn test_cart_totals() {
        let cart = Cart::from_lines(vec![line(8_900, 2), line(12_000, 1)]);
        assert_eq!(cart.subtotal, Price::won(29_800));
        assert_eq!(cart.item_count, 3);
    }

    #[test]
    fn test_quantity_of() {
        let first = line(1_000, 4);
        let product_id = first.product.id;
        let cart = Cart::from_lines(vec![first, line(2_000, 1)]);
        assert_eq!(cart.quantity_of(product_id), 4);
        assert_eq!(cart.quantity_of(ProductId::random()), 0);
    }

    #[test]
    fn test_empty_cart() {
        let cart = Cart::default();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal, Price::ZERO);
    }
}
