//! Pre-mutation checks.
//!
//! Pure and synchronous. A failed check returns before any backend write.

use haneul_core::Rating;

use super::ValidationError;
use crate::models::Product;

/// Check that `quantity` units of `product` can be added to a cart.
///
/// Order: availability, sold-out flag, quantity, stock. The sold-out flag
/// wins over any stock count.
///
/// # Errors
///
/// Returns the first failed check.
pub fn check_cart_add(product: &Product, quantity: u32) -> Result<(), ValidationError> {
    if !product.is_available {
        return Err(ValidationError::Unavailable);
    }
    if product.is_out_of_stock {
        return Err(ValidationError::OutOfStock);
    }
    check_quantity(quantity)?;
    check_stock(product, quantity)
}

/// Quantity of any cart line must be at least one.
///
/// # Errors
///
/// Returns `InvalidQuantity` for zero.
pub const fn check_quantity(quantity: u32) -> Result<(), ValidationError> {
    if quantity == 0 {
        return Err(ValidationError::InvalidQuantity);
    }
    Ok(())
}

/// Reject `quantity` above a tracked stock count.
///
/// # Errors
///
/// Returns `InsufficientStock` when `stock` is set and smaller.
pub fn check_stock(product: &Product, quantity: u32) -> Result<(), ValidationError> {
    let Some(stock) = product.stock else {
        return Ok(());
    };
    let available = u32::try_from(stock).unwrap_or(0);
    if quantity > available {
        return Err(ValidationError::InsufficientStock {
            requested: quantity,
            available,
        });
    }
    Ok(())
}

/// Validate review input; returns the rating and trimmed content.
///
/// # Errors
///
/// Returns `InvalidRating` outside 1..=5, `EmptyReview` for blank content.
pub fn check_review(rating: i32, content: &str) -> Result<(Rating, String), ValidationError> {
    let rating = Rating::new(rating)?;
    let content = content.trim();
    if content.is_empty() {
        return Err(ValidationError::EmptyReview);
    }
    Ok((rating, content.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::testing::product;

    #[test]
    fn test_quantity_above_stock_is_rejected() {
        let product = product(5_000, Some(2));
        assert_eq!(
            check_cart_add(&product, 3),
            Err(ValidationError::InsufficientStock {
                requested: 3,
                available: 2
            })
        );
        assert_eq!(check_cart_add(&product, 2), Ok(()));
    }

    #[test]
    fn test_out_of_stock_flag_wins_over_stock() {
        let mut product = product(5_000, Some(100));
        product.is_out_of_stock = true;
        assert_eq!(check_cart_add(&product, 1), Err(ValidationError::OutOfStock));
    }

    #[test]
    fn test_unavailable_checked_first() {
        let mut product = product(5_000, Some(0));
        product.is_available = false;
        product.is_out_of_stock = true;
        assert_eq!(check_cart_add(&product, 1), Err(ValidationError::Unavailable));
    }

    #[test]
    fn test_untracked_stock_allows_any_quantity() {
        let product = product(5_000, None);
        assert_eq!(check_cart_add(&product, 999), Ok(()));
        assert_eq!(check_cart_add(&product, 0), Err(ValidationError::InvalidQuantity));
    }

    #[test]
    fn test_negative_stock_counts_as_zero() {
        let product = product(5_000, Some(-4));
        assert_eq!(
            check_cart_add(&product, 1),
            Err(ValidationError::InsufficientStock {
                requested: 1,
                available: 0
            })
        );
    }

    #[test]
    fn test_review_input() {
        let (rating, content) = check_review(4, "  맛있어요  ").unwrap();
        assert_eq!(rating.stars(), 4);
        assert_eq!(content, "맛있어요");

        assert!(matches!(
            check_review(0, "좋아요"),
            Err(ValidationError::InvalidRating(_))
        ));
        assert_eq!(check_review(5, "   "), Err(ValidationError::EmptyReview));
    }
}
