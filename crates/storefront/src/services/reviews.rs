//! Product reviews.
//!
//! Submitting a review runs two backend pre-checks in sequence before the
//! insert: the user must have ordered the product, and must not have reviewed
//! it yet. The gate keeps one user's submissions from overlapping; across
//! instances the backend's unique index on `(user_id, product_id)` is the
//! last word, and its conflict maps to `AlreadyReviewed`.

use tracing::{instrument, warn};

use haneul_core::{OrderStatus, ProductId, ReviewId};

use super::{StoreError, Storefront, ValidationError, guards, require_user, write_failed};
use crate::backend::{Backend, BackendError, Filter};
use crate::models::{NewReview, Order, OrderItem, Review, User};
use crate::query::{MutationContext, MutationKind, QueryKey};

impl<B: Backend> Storefront<B> {
    /// Reviews of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Remote` if the read fails.
    #[instrument(skip(self))]
    pub async fn product_reviews(&self, product_id: ProductId) -> Result<Vec<Review>, StoreError> {
        self.read(QueryKey::ProductReviews(product_id), |backend| async move {
            backend
                .select(
                    &Filter::new()
                        .eq("product_id", product_id)
                        .order_desc("created_at"),
                )
                .await
        })
        .await
    }

    /// Submit a review for a purchased product.
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired`, `NotConfigured`, `InvalidRating`,
    /// `EmptyReview`, `NotPurchased`, `AlreadyReviewed`, `Pending` or
    /// `Remote`.
    #[instrument(skip(self, session, content))]
    pub async fn create_review(
        &self,
        session: Option<&User>,
        product_id: ProductId,
        rating: i32,
        content: &str,
    ) -> Result<Review, StoreError> {
        let user = require_user(session)?;
        self.backend()?;
        let (rating, content) = guards::check_review(rating, content).inspect_err(|err| {
            warn!(user_id = %user.id, %product_id, error = %err, "Review rejected");
        })?;

        let kind = MutationKind::CreateReview;
        let (_guard, backend) = self.begin(kind, user)?;

        if !has_purchased(backend, user, product_id)
            .await
            .map_err(|err| write_failed(kind, err))?
        {
            warn!(user_id = %user.id, %product_id, "Review rejected: not purchased");
            return Err(ValidationError::NotPurchased.into());
        }

        let existing: Vec<Review> = backend
            .select(
                &Filter::new()
                    .eq("user_id", user.id)
                    .eq("product_id", product_id)
                    .limit(1),
            )
            .await
            .map_err(|err| write_failed(kind, err))?;
        if !existing.is_empty() {
            warn!(user_id = %user.id, %product_id, "Review rejected: already reviewed");
            return Err(ValidationError::AlreadyReviewed.into());
        }

        let review = backend
            .insert::<Review, _>(&NewReview {
                user_id: user.id,
                product_id,
                rating,
                content,
                author_name: user.name.clone(),
            })
            .await
            .map_err(|err| match err {
                BackendError::Status { status: 409, .. } => {
                    warn!(user_id = %user.id, %product_id, "Review insert hit unique index");
                    StoreError::from(ValidationError::AlreadyReviewed)
                }
                other => write_failed(kind, other),
            })?;

        self.complete(kind, MutationContext::user(user.id).with_product(product_id))
            .await;
        Ok(review)
    }

    /// Delete one of the user's own reviews.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown review and `Forbidden` for someone
    /// else's.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn delete_review(&self, user: &User, review_id: ReviewId) -> Result<(), StoreError> {
        let kind = MutationKind::DeleteReview;
        let (_guard, backend) = self.begin(kind, user)?;

        let by_id = Filter::new().eq("id", review_id);
        let review = backend
            .select::<Review>(&by_id.clone().limit(1))
            .await
            .map_err(|err| write_failed(kind, err))?
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound)?;
        if review.user_id != user.id {
            warn!(user_id = %user.id, %review_id, "Rejected delete of another user's review");
            return Err(StoreError::Forbidden);
        }

        backend
            .delete::<Review>(&by_id.eq("user_id", user.id))
            .await
            .map_err(|err| write_failed(kind, err))?;

        self.complete(
            kind,
            MutationContext::user(user.id).with_product(review.product_id),
        )
        .await;
        Ok(())
    }
}

/// Whether any of the user's non-cancelled orders contains `product_id`.
async fn has_purchased<B: Backend>(
    backend: &B,
    user: &User,
    product_id: ProductId,
) -> Result<bool, BackendError> {
    let orders: Vec<Order> = backend.select(&Filter::new().eq("user_id", user.id)).await?;
    let order_ids: Vec<_> = orders
        .iter()
        .filter(|order| order.status != OrderStatus::Cancelled)
        .map(|order| order.id)
        .collect();
    if order_ids.is_empty() {
        return Ok(false);
    }

    let items: Vec<OrderItem> = backend
        .select(
            &Filter::new()
                .is_in("order_id", order_ids)
                .eq("product_id", product_id)
                .limit(1),
        )
        .await?;
    Ok(!items.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use haneul_core::{OrderId, OrderItemId, Price};

    use super::*;
    use crate::backend::MemoryBackend;
    use crate::backend::memory::Op;
    use crate::services::testing::{product, storefront, user};

    fn seed_purchase(backend: &MemoryBackend, buyer: &User, product_id: ProductId) {
        let order = Order {
            id: OrderId::random(),
            user_id: buyer.id,
            status: OrderStatus::Delivered,
            total_amount: Price::won(10_000),
            recipient: None,
            phone: None,
            address: None,
            created_at: Utc::now(),
            items: Vec::new(),
        };
        backend.seed(&[OrderItem {
            id: OrderItemId::random(),
            order_id: order.id,
            product_id,
            quantity: 1,
            price: Price::won(10_000),
        }]);
        backend.seed(&[order]);
    }

    #[tokio::test]
    async fn test_review_requires_purchase() {
        let (store, backend) = storefront();
        let buyer = user();
        let item = product(10_000, None);

        let err = store
            .create_review(Some(&buyer), item.id, 5, "최고예요")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::NotPurchased)
        ));
        assert_eq!(backend.writes("reviews"), 0);
    }

    #[tokio::test]
    async fn test_second_review_is_rejected() {
        let (store, backend) = storefront();
        let buyer = user();
        let item = product(10_000, None);
        seed_purchase(&backend, &buyer, item.id);

        let review = store
            .create_review(Some(&buyer), item.id, 4, "  신선해요 ")
            .await
            .unwrap();
        assert_eq!(review.content, "신선해요");
        assert_eq!(review.author_name.as_deref(), Some("김하늘"));

        let err = store
            .create_review(Some(&buyer), item.id, 5, "또 샀어요")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::AlreadyReviewed)
        ));
        assert_eq!(backend.writes("reviews"), 1);
    }

    #[tokio::test]
    async fn test_pre_checks_run_in_order_before_insert() {
        let (store, backend) = storefront();
        let buyer = user();
        let item = product(10_000, None);
        seed_purchase(&backend, &buyer, item.id);

        store
            .create_review(Some(&buyer), item.id, 5, "좋아요")
            .await
            .unwrap();

        let tables: Vec<_> = backend
            .calls()
            .into_iter()
            .map(|call| (call.op, call.table))
            .collect();
        assert_eq!(
            tables,
            vec![
                (Op::Select, Some("orders")),
                (Op::Select, Some("order_items")),
                (Op::Select, Some("reviews")),
                (Op::Insert, Some("reviews")),
            ]
        );
    }

    #[tokio::test]
    async fn test_racing_instances_store_one_review() {
        let (first, backend) = storefront();
        let second = Storefront::new(Some(backend.clone()), &crate::config::CacheConfig::default()).unwrap();
        let buyer = user();
        let item = product(10_000, None);
        seed_purchase(&backend, &buyer, item.id);
        backend.unique("reviews", &["user_id", "product_id"]);
        backend.set_read_delay(std::time::Duration::from_millis(10));

        let (a, b) = tokio::join!(
            first.create_review(Some(&buyer), item.id, 5, "좋아요"),
            second.create_review(Some(&buyer), item.id, 4, "괜찮아요"),
        );

        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes.iter().any(|r| matches!(
            r,
            Err(StoreError::Validation(ValidationError::AlreadyReviewed))
        )));
        assert_eq!(backend.rows::<Review>().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_input_skips_backend() {
        let (store, backend) = storefront();
        let buyer = user();
        let item = product(10_000, None);

        assert!(matches!(
            store.create_review(Some(&buyer), item.id, 6, "좋아요").await,
            Err(StoreError::Validation(ValidationError::InvalidRating(_)))
        ));
        assert!(matches!(
            store.create_review(Some(&buyer), item.id, 3, " \n ").await,
            Err(StoreError::Validation(ValidationError::EmptyReview))
        ));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_review_invalidates_product_reviews() {
        let (store, backend) = storefront();
        let buyer = user();
        let item = product(10_000, None);
        seed_purchase(&backend, &buyer, item.id);

        assert!(store.product_reviews(item.id).await.unwrap().is_empty());
        store
            .create_review(Some(&buyer), item.id, 5, "좋아요")
            .await
            .unwrap();
        assert_eq!(store.product_reviews(item.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_only_own_review() {
        let (store, backend) = storefront();
        let buyer = user();
        let item = product(10_000, None);
        seed_purchase(&backend, &buyer, item.id);
        let review = store
            .create_review(Some(&buyer), item.id, 5, "좋아요")
            .await
            .unwrap();

        assert!(matches!(
            store.delete_review(&user(), review.id).await,
            Err(StoreError::Forbidden)
        ));
        store.delete_review(&buyer, review.id).await.unwrap();
        assert!(store.product_reviews(item.id).await.unwrap().is_empty());
    }
}
