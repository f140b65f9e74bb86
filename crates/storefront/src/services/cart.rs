//! Cart lines.

use std::collections::HashMap;

use tracing::{instrument, warn};

use haneul_core::{CartItemId, ProductId, UserId};

use super::{StoreError, Storefront, guards, require_user, write_failed};
use crate::backend::{Backend, BackendError, Filter};
use crate::models::{Cart, CartItem, CartLine, NewCartItem, Product, User};
use crate::query::{MutationContext, MutationKind, QueryKey};

#[derive(serde::Serialize)]
struct QuantityPatch {
    quantity: u32,
}

/// Read the cart straight from the backend.
pub(super) async fn load_cart<B: Backend>(backend: &B, user_id: UserId) -> Result<Cart, BackendError> {
    let items: Vec<CartItem> = backend
        .select(&Filter::new().eq("user_id", user_id).order_asc("created_at"))
        .await?;
    if items.is_empty() {
        return Ok(Cart::default());
    }

    let products: Vec<Product> = backend
        .select(&Filter::new().is_in("id", items.iter().map(|item| item.product_id)))
        .await?;
    let by_id: HashMap<ProductId, Product> =
        products.into_iter().map(|product| (product.id, product)).collect();

    let lines = items
        .into_iter()
        .filter_map(|item| {
            let product = by_id.get(&item.product_id)?.clone();
            Some(CartLine::new(item, product))
        })
        .collect();
    Ok(Cart::from_lines(lines))
}

impl<B: Backend> Storefront<B> {
    /// The user's cart with products joined in. Lines whose product no
    /// longer exists are left out.
    ///
    /// # Errors
    ///
    /// Returns `Remote` if a read fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn cart(&self, user: &User) -> Result<Cart, StoreError> {
        let user_id = user.id;
        self.read(QueryKey::Cart(user_id), |backend| load_cart(backend, user_id))
            .await
    }

    /// Add `quantity` units of a product to the signed-in user's cart.
    ///
    /// Checks, in order: signed in, backend configured, product for sale, not
    /// sold out, quantity at least one, stock. A product already in the cart
    /// has its quantity increased, and the combined quantity is checked
    /// against stock too.
    ///
    /// # Errors
    ///
    /// Returns the first failed check; nothing is written in that case.
    #[instrument(skip(self, session))]
    pub async fn add_to_cart(
        &self,
        session: Option<&User>,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartItem, StoreError> {
        let user = require_user(session)?;
        self.backend()?;

        let product = self.get_product(product_id).await?;
        guards::check_cart_add(&product, quantity).inspect_err(|err| {
            warn!(user_id = %user.id, %product_id, quantity, error = %err, "Add to cart rejected");
        })?;

        let kind = MutationKind::AddToCart;
        let (_guard, backend) = self.begin(kind, user)?;

        let existing: Vec<CartItem> = backend
            .select(
                &Filter::new()
                    .eq("user_id", user.id)
                    .eq("product_id", product_id)
                    .limit(1),
            )
            .await
            .map_err(|err| write_failed(kind, err))?;

        let item = if let Some(existing) = existing.into_iter().next() {
            let combined = existing.quantity.saturating_add(quantity);
            guards::check_stock(&product, combined)?;
            let updated: Vec<CartItem> = backend
                .update(
                    &Filter::new().eq("id", existing.id),
                    &QuantityPatch { quantity: combined },
                )
                .await
                .map_err(|err| write_failed(kind, err))?;
            updated.into_iter().next().ok_or(StoreError::NotFound)?
        } else {
            backend
                .insert(&NewCartItem {
                    user_id: user.id,
                    product_id,
                    quantity,
                })
                .await
                .map_err(|err| write_failed(kind, err))?
        };

        self.complete(kind, MutationContext::user(user.id).with_product(product_id))
            .await;
        Ok(item)
    }

    /// Change the quantity of one of the user's cart lines.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` for zero, `InsufficientStock` above stock,
    /// `NotFound` if the line is not the user's.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn update_cart_item(
        &self,
        user: &User,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<CartItem, StoreError> {
        guards::check_quantity(quantity)?;
        let kind = MutationKind::UpdateCartItem;
        let (_guard, backend) = self.begin(kind, user)?;

        let owned = Filter::new().eq("id", item_id).eq("user_id", user.id);
        let item = backend
            .select::<CartItem>(&owned.clone().limit(1))
            .await
            .map_err(|err| write_failed(kind, err))?
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound)?;

        let product = self.get_product(item.product_id).await?;
        guards::check_stock(&product, quantity)?;

        let updated: Vec<CartItem> = backend
            .update(&owned, &QuantityPatch { quantity })
            .await
            .map_err(|err| write_failed(kind, err))?;
        let updated = updated.into_iter().next().ok_or(StoreError::NotFound)?;

        self.complete(kind, MutationContext::user(user.id)).await;
        Ok(updated)
    }

    /// Remove one of the user's cart lines.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the line is not the user's.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn remove_cart_item(&self, user: &User, item_id: CartItemId) -> Result<(), StoreError> {
        let kind = MutationKind::RemoveCartItem;
        let (_guard, backend) = self.begin(kind, user)?;

        let removed = backend
            .delete::<CartItem>(&Filter::new().eq("id", item_id).eq("user_id", user.id))
            .await
            .map_err(|err| write_failed(kind, err))?;
        if removed == 0 {
            return Err(StoreError::NotFound);
        }

        self.complete(kind, MutationContext::user(user.id)).await;
        Ok(())
    }
}
