//! Shipment tracking.

use tracing::instrument;

use haneul_core::OrderId;

use super::{StoreError, Storefront};
use crate::backend::{Backend, BackendError, Filter};
use crate::models::{DeliveryTracking, TrackingView, User};
use crate::query::QueryKey;

impl<B: Backend> Storefront<B> {
    /// Latest tracking record of one of the user's orders, with its display
    /// badge and timeline step. `None` until the order has shipped.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the order is not the user's.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn delivery_tracking(
        &self,
        user: &User,
        order_id: OrderId,
    ) -> Result<Option<TrackingView>, StoreError> {
        self.order(user, order_id).await?;

        self.read(QueryKey::DeliveryTracking(user.id, order_id), |backend| async move {
            let rows: Vec<DeliveryTracking> = backend
                .select(
                    &Filter::new()
                        .eq("order_id", order_id)
                        .order_desc("updated_at")
                        .limit(1),
                )
                .await?;
            Ok::<_, BackendError>(rows.into_iter().next().map(TrackingView::from))
        })
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use haneul_core::{DeliveryStatus, OrderStatus, Price, TrackingId, Tone};

    use super::*;
    use crate::models::Order;
    use crate::services::testing::{storefront, user};

    fn order(owner: &User) -> Order {
        Order {
            id: OrderId::random(),
            user_id: owner.id,
            status: OrderStatus::Shipped,
            total_amount: Price::won(15_000),
            recipient: None,
            phone: None,
            address: None,
            created_at: Utc::now(),
            items: Vec::new(),
        }
    }

    fn tracking(order_id: OrderId, status: &str) -> DeliveryTracking {
        DeliveryTracking {
            id: TrackingId::random(),
            order_id,
            courier: "CJ대한통운".to_string(),
            tracking_number: "6543-2109-8765".to_string(),
            status: DeliveryStatus::from(status),
            estimated_delivery: None,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_tracking_view() {
        let (store, backend) = storefront();
        let buyer = user();
        let placed = order(&buyer);
        backend.seed(&[placed.clone()]);
        backend.seed(&[tracking(placed.id, "in_transit")]);

        let view = store.delivery_tracking(&buyer, placed.id).await.unwrap().unwrap();
        assert_eq!(view.tracking.status, DeliveryStatus::InTransit);
        assert_eq!(view.progress_step, DeliveryStatus::InTransit.progress_step());
        assert!(!view.is_terminal);
    }

    #[tokio::test]
    async fn test_unknown_status_renders_fallback() {
        let (store, backend) = storefront();
        let buyer = user();
        let placed = order(&buyer);
        backend.seed(&[placed.clone()]);
        backend.seed(&[tracking(placed.id, "held_at_customs")]);

        let view = store.delivery_tracking(&buyer, placed.id).await.unwrap().unwrap();
        assert!(view.tracking.status.is_unknown());
        assert_eq!(view.display.label, "알 수 없음");
        assert_eq!(view.display.tone, Tone::Gray);
    }

    #[tokio::test]
    async fn test_not_shipped_and_not_owned() {
        let (store, backend) = storefront();
        let buyer = user();
        let placed = order(&buyer);
        backend.seed(&[placed.clone()]);

        assert!(store.delivery_tracking(&buyer, placed.id).await.unwrap().is_none());
        assert!(matches!(
            store.delivery_tracking(&user(), placed.id).await,
            Err(StoreError::NotFound)
        ));
    }
}
