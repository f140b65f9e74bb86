//! Checkout and order history.

use std::collections::HashMap;

use tracing::{error, instrument, warn};

use haneul_core::{OrderId, OrderStatus};

use super::cart::load_cart;
use super::{StoreError, Storefront, ValidationError, require_user, write_failed};
use crate::backend::{Backend, BackendError, Filter};
use crate::models::{Cart, CartItem, NewOrder, NewOrderItem, Order, OrderItem, ShippingInfo, User};
use crate::query::{MutationContext, MutationKind, QueryKey};

#[derive(serde::Serialize)]
struct StatusPatch {
    status: OrderStatus,
}

/// Attach line items to their orders.
fn with_items(mut orders: Vec<Order>, items: Vec<OrderItem>) -> Vec<Order> {
    let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
    for item in items {
        by_order.entry(item.order_id).or_default().push(item);
    }
    for order in &mut orders {
        order.items = by_order.remove(&order.id).unwrap_or_default();
    }
    orders
}

impl<B: Backend> Storefront<B> {
    /// The user's orders with line items, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Remote` if a read fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn orders(&self, user: &User) -> Result<Vec<Order>, StoreError> {
        let user_id = user.id;
        self.read(QueryKey::Orders(user_id), |backend| async move {
            let orders: Vec<Order> = backend
                .select(&Filter::new().eq("user_id", user_id).order_desc("created_at"))
                .await?;
            if orders.is_empty() {
                return Ok(orders);
            }
            let items: Vec<OrderItem> = backend
                .select(&Filter::new().is_in("order_id", orders.iter().map(|o| o.id)))
                .await?;
            Ok::<_, BackendError>(with_items(orders, items))
        })
        .await
    }

    /// One of the user's orders with its line items.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the order does not exist or is someone else's.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn order(&self, user: &User, order_id: OrderId) -> Result<Order, StoreError> {
        let user_id = user.id;
        let order: Option<Order> = self
            .read(QueryKey::Order(user_id, order_id), |backend| async move {
                let orders: Vec<Order> = backend
                    .select(
                        &Filter::new()
                            .eq("id", order_id)
                            .eq("user_id", user_id)
                            .limit(1),
                    )
                    .await?;
                if orders.is_empty() {
                    return Ok(None);
                }
                let items: Vec<OrderItem> = backend
                    .select(&Filter::new().eq("order_id", order_id))
                    .await?;
                Ok::<_, BackendError>(with_items(orders, items).into_iter().next())
            })
            .await?;
        order.ok_or(StoreError::NotFound)
    }

    /// Place an order for everything in the user's cart.
    ///
    /// The cart is read from the backend inside the mutation, not from the
    /// cache. Inserts the order, then its items at current prices, then
    /// deletes exactly the ordered cart rows, so a line added meanwhile stays
    /// in the cart. If a later write fails, the order and its items are
    /// deleted again before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired` signed out, `EmptyCart` with nothing to order,
    /// `Remote` if a read or write fails.
    #[instrument(skip(self, session, shipping))]
    pub async fn create_order(
        &self,
        session: Option<&User>,
        shipping: ShippingInfo,
    ) -> Result<Order, StoreError> {
        let user = require_user(session)?;
        let kind = MutationKind::CreateOrder;
        let (_guard, backend) = self.begin(kind, user)?;

        let cart = load_cart(backend, user.id)
            .await
            .map_err(|err| write_failed(kind, err))?;
        if cart.is_empty() {
            warn!(user_id = %user.id, "Order rejected: empty cart");
            return Err(ValidationError::EmptyCart.into());
        }

        let mut order: Order = backend
            .insert(&NewOrder {
                user_id: user.id,
                status: OrderStatus::Pending,
                total_amount: cart.subtotal,
                recipient: shipping.recipient,
                phone: shipping.phone,
                address: shipping.address,
            })
            .await
            .map_err(|err| write_failed(kind, err))?;
        let ctx = MutationContext::user(user.id).with_order(order.id);

        let filled = Self::fill_order(backend, &order, &cart).await;
        match filled {
            Ok(items) => order.items = items,
            Err(err) => {
                let err = write_failed(kind, err);
                Self::discard_order(backend, order.id).await;
                self.abandon(kind, ctx).await;
                return Err(err);
            }
        }

        self.complete(kind, ctx).await;
        Ok(order)
    }

    /// Insert the order's items and delete the cart rows they came from.
    async fn fill_order(backend: &B, order: &Order, cart: &Cart) -> Result<Vec<OrderItem>, BackendError> {
        let lines: Vec<NewOrderItem> = cart
            .lines
            .iter()
            .map(|line| NewOrderItem {
                order_id: order.id,
                product_id: line.product.id,
                quantity: line.item.quantity,
                price: line.product.price,
            })
            .collect();
        let items = backend.insert_many(&lines).await?;

        backend
            .delete::<CartItem>(
                &Filter::new()
                    .eq("user_id", order.user_id)
                    .is_in("id", cart.lines.iter().map(|line| line.item.id)),
            )
            .await?;
        Ok(items)
    }

    /// Best-effort removal of a half-placed order.
    async fn discard_order(backend: &B, order_id: OrderId) {
        if let Err(err) = backend
            .delete::<OrderItem>(&Filter::new().eq("order_id", order_id))
            .await
        {
            error!(%order_id, error = %err, "Failed to remove items of abandoned order");
        }
        if let Err(err) = backend.delete::<Order>(&Filter::new().eq("id", order_id)).await {
            error!(%order_id, error = %err, "Failed to remove abandoned order");
        }
    }

    /// Cancel one of the user's orders while it is still pending or
    /// processing.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for someone else's order and `NotCancellable` once
    /// it has shipped.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn cancel_order(&self, user: &User, order_id: OrderId) -> Result<Order, StoreError> {
        let kind = MutationKind::CancelOrder;
        let (_guard, backend) = self.begin(kind, user)?;

        let owned = Filter::new().eq("id", order_id).eq("user_id", user.id);
        let current = backend
            .select::<Order>(&owned.clone().limit(1))
            .await
            .map_err(|err| write_failed(kind, err))?
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound)?;
        if !current.status.is_cancellable() {
            warn!(user_id = %user.id, %order_id, status = %current.status, "Cancel rejected");
            return Err(ValidationError::NotCancellable.into());
        }

        let updated: Vec<Order> = backend
            .update(
                &owned,
                &StatusPatch {
                    status: OrderStatus::Cancelled,
                },
            )
            .await
            .map_err(|err| write_failed(kind, err))?;
        let updated = updated.into_iter().next().ok_or(StoreError::NotFound)?;

        self.complete(kind, MutationContext::user(user.id).with_order(order_id))
            .await;
        Ok(updated)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use haneul_core::Price;

    use super::*;
    use crate::services::testing::{product, storefront, user};

    fn shipping() -> ShippingInfo {
        ShippingInfo {
            recipient: "김하늘".to_string(),
            phone: "010-1234-5678".to_string(),
            address: "서울시 마포구 월드컵로 1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_checkout_moves_cart_into_order() {
        let (store, backend) = storefront();
        let shopper = user();
        let rice = product(8_900, None);
        let kimchi = product(12_000, Some(3));
        backend.seed(&[rice.clone(), kimchi.clone()]);

        store.add_to_cart(Some(&shopper), rice.id, 2).await.unwrap();
        store.add_to_cart(Some(&shopper), kimchi.id, 1).await.unwrap();
        assert!(store.orders(&shopper).await.unwrap().is_empty());

        let order = store.create_order(Some(&shopper), shipping()).await.unwrap();
        assert_eq!(order.total_amount, Price::won(29_800));
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.status, OrderStatus::Pending);

        assert!(store.cart(&shopper).await.unwrap().is_empty());
        let history = store.orders(&shopper).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].items.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_cart_checkout() {
        let (store, backend) = storefront();
        let err = store.create_order(Some(&user()), shipping()).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::EmptyCart)
        ));
        assert_eq!(backend.total_writes(), 0);
    }

    #[tokio::test]
    async fn test_line_added_during_checkout_stays_in_cart() {
        let (store, backend) = storefront();
        let shopper = user();
        let rice = product(8_900, None);
        let kimchi = product(12_000, None);
        backend.seed(&[rice.clone(), kimchi.clone()]);
        store.add_to_cart(Some(&shopper), rice.id, 1).await.unwrap();
        backend.set_read_delay(Duration::from_millis(30));

        let (order, added) = tokio::join!(
            store.create_order(Some(&shopper), shipping()),
            async {
                tokio::time::sleep(Duration::from_millis(8)).await;
                store.add_to_cart(Some(&shopper), kimchi.id, 1).await
            }
        );
        let order = order.unwrap();
        added.unwrap();

        let ordered = order.items.iter().any(|item| item.product_id == kimchi.id);
        let kept = backend
            .rows::<CartItem>()
            .iter()
            .any(|row| row.product_id == kimchi.id);
        assert!(ordered ^ kept, "line was ordered={ordered} kept={kept}");
        assert!(
            !backend
                .rows::<CartItem>()
                .iter()
                .any(|row| row.product_id == rice.id)
        );
    }

    #[tokio::test]
    async fn test_failed_item_insert_removes_order() {
        let (store, backend) = storefront();
        let shopper = user();
        let rice = product(8_900, None);
        backend.seed(&[rice.clone()]);
        store.add_to_cart(Some(&shopper), rice.id, 1).await.unwrap();

        backend.fail_nth_write(2);
        let err = store.create_order(Some(&shopper), shipping()).await.unwrap_err();

        assert!(err.is_remote());
        assert!(backend.rows::<Order>().is_empty());
        assert!(backend.rows::<OrderItem>().is_empty());
        assert_eq!(store.cart(&shopper).await.unwrap().item_count, 1);
    }

    #[tokio::test]
    async fn test_failed_cart_cleanup_rolls_back_order() {
        let (store, backend) = storefront();
        let shopper = user();
        let rice = product(8_900, None);
        backend.seed(&[rice.clone()]);
        store.add_to_cart(Some(&shopper), rice.id, 2).await.unwrap();

        backend.fail_nth_write(3);
        assert!(store.create_order(Some(&shopper), shipping()).await.is_err());

        assert!(backend.rows::<Order>().is_empty());
        assert!(backend.rows::<OrderItem>().is_empty());
        assert_eq!(backend.rows::<CartItem>().len(), 1);
        assert!(store.orders(&shopper).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_order_left_by_failed_rollback_is_listed() {
        let (store, backend) = storefront();
        let shopper = user();
        let rice = product(8_900, None);
        backend.seed(&[rice.clone()]);
        store.add_to_cart(Some(&shopper), rice.id, 1).await.unwrap();
        assert!(store.orders(&shopper).await.unwrap().is_empty());

        // items insert fails, then so does deleting the order row
        backend.fail_nth_write(2);
        backend.fail_nth_write(4);
        assert!(store.create_order(Some(&shopper), shipping()).await.is_err());

        assert_eq!(backend.rows::<Order>().len(), 1);
        assert_eq!(store.orders(&shopper).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_only_before_shipping() {
        let (store, backend) = storefront();
        let shopper = user();
        let rice = product(8_900, None);
        backend.seed(&[rice.clone()]);
        store.add_to_cart(Some(&shopper), rice.id, 1).await.unwrap();
        let order = store.create_order(Some(&shopper), shipping()).await.unwrap();

        assert_eq!(store.order(&shopper, order.id).await.unwrap().status, OrderStatus::Pending);
        let cancelled = store.cancel_order(&shopper, order.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(
            store.order(&shopper, order.id).await.unwrap().status,
            OrderStatus::Cancelled
        );

        assert!(matches!(
            store.cancel_order(&shopper, order.id).await,
            Err(StoreError::Validation(ValidationError::NotCancellable))
        ));
    }

    #[tokio::test]
    async fn test_other_users_order_is_not_found() {
        let (store, backend) = storefront();
        let shopper = user();
        let rice = product(8_900, None);
        backend.seed(&[rice.clone()]);
        store.add_to_cart(Some(&shopper), rice.id, 1).await.unwrap();
        let order = store.create_order(Some(&shopper), shipping()).await.unwrap();

        let stranger = user();
        assert!(matches!(
            store.order(&stranger, order.id).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            store.cancel_order(&stranger, order.id).await,
            Err(StoreError::NotFound)
        ));
    }
}
