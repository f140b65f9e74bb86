//! Refund request status. Read-only: requests are created and decided
//! outside the storefront.

use tracing::instrument;

use haneul_core::OrderId;

use super::{StoreError, Storefront};
use crate::backend::{Backend, BackendError, Filter};
use crate::models::{RefundRequest, User};
use crate::query::QueryKey;

impl<B: Backend> Storefront<B> {
    /// The latest refund request for one of the user's orders, if any.
    ///
    /// # Errors
    ///
    /// Returns `Remote` if the read fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn refund_for_order(
        &self,
        user: &User,
        order_id: OrderId,
    ) -> Result<Option<RefundRequest>, StoreError> {
        let user_id = user.id;
        self.read(QueryKey::RefundCheck(user_id, order_id), |backend| async move {
            let rows: Vec<RefundRequest> = backend
                .select(
                    &Filter::new()
                        .eq("order_id", order_id)
                        .eq("user_id", user_id)
                        .order_desc("created_at")
                        .limit(1),
                )
                .await?;
            Ok::<_, BackendError>(rows.into_iter().next())
        })
        .await
    }

    /// Every refund request of the user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Remote` if the read fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn refund_requests(&self, user: &User) -> Result<Vec<RefundRequest>, StoreError> {
        let user_id = user.id;
        self.read(QueryKey::RefundRequests(user_id), |backend| async move {
            backend
                .select(&Filter::new().eq("user_id", user_id).order_desc("created_at"))
                .await
        })
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use haneul_core::{RefundRequestId, RefundStatus};

    use super::*;
    use crate::services::testing::{storefront, user};

    #[tokio::test]
    async fn test_refund_lookup_is_per_user() {
        let (store, backend) = storefront();
        let buyer = user();
        let order_id = OrderId::random();
        backend.seed(&[RefundRequest {
            id: RefundRequestId::random(),
            order_id,
            user_id: buyer.id,
            reason: "상품이 파손되어 도착했습니다".to_string(),
            status: RefundStatus::Pending,
            admin_note: None,
            created_at: Utc::now(),
        }]);

        let found = store.refund_for_order(&buyer, order_id).await.unwrap().unwrap();
        assert_eq!(found.status, RefundStatus::Pending);
        assert_eq!(found.display().label, RefundStatus::Pending.display().label);

        assert!(store.refund_for_order(&user(), order_id).await.unwrap().is_none());
        assert_eq!(store.refund_requests(&buyer).await.unwrap().len(), 1);
    }
}
