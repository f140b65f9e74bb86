//! Favorite ("찜") membership.

use std::collections::HashMap;

use tracing::instrument;

use haneul_core::ProductId;

use super::{StoreError, Storefront, require_user, write_failed};
use crate::backend::{Backend, BackendError, Filter};
use crate::models::{Favorite, FavoriteProduct, NewFavorite, Product, User};
use crate::query::{MutationContext, MutationKind, QueryKey};

impl<B: Backend> Storefront<B> {
    /// The user's favorites, most recent first, with products joined in.
    ///
    /// # Errors
    ///
    /// Returns `Remote` if a read fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn favorites(&self, user: &User) -> Result<Vec<FavoriteProduct>, StoreError> {
        let user_id = user.id;
        self.read(QueryKey::Favorites(user_id), |backend| async move {
            let favorites: Vec<Favorite> = backend
                .select(&Filter::new().eq("user_id", user_id).order_desc("created_at"))
                .await?;
            if favorites.is_empty() {
                return Ok(Vec::new());
            }

            let products: Vec<Product> = backend
                .select(&Filter::new().is_in("id", favorites.iter().map(|f| f.product_id)))
                .await?;
            let by_id: HashMap<ProductId, Product> =
                products.into_iter().map(|product| (product.id, product)).collect();

            Ok::<_, BackendError>(
                favorites
                    .into_iter()
                    .filter_map(|favorite| {
                        let product = by_id.get(&favorite.product_id)?.clone();
                        Some(FavoriteProduct { favorite, product })
                    })
                    .collect(),
            )
        })
        .await
    }

    /// Whether `product_id` is in the user's favorites.
    ///
    /// # Errors
    ///
    /// Returns `Remote` if the read fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn is_favorite(&self, user: &User, product_id: ProductId) -> Result<bool, StoreError> {
        let user_id = user.id;
        self.read(QueryKey::FavoriteStatus(user_id, product_id), |backend| async move {
            let rows: Vec<Favorite> = backend
                .select(
                    &Filter::new()
                        .eq("user_id", user_id)
                        .eq("product_id", product_id)
                        .limit(1),
                )
                .await?;
            Ok::<_, BackendError>(!rows.is_empty())
        })
        .await
    }

    /// Flip membership of `product_id`; returns the new membership.
    ///
    /// A signed-out caller gets `AuthRequired` and the backend is never
    /// called.
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired`, `NotConfigured`, `Pending` or `Remote`.
    #[instrument(skip(self, session))]
    pub async fn toggle_favorite(
        &self,
        session: Option<&User>,
        product_id: ProductId,
    ) -> Result<bool, StoreError> {
        let user = require_user(session)?;
        let kind = MutationKind::ToggleFavorite;
        let (_guard, backend) = self.begin(kind, user)?;

        let membership = Filter::new()
            .eq("user_id", user.id)
            .eq("product_id", product_id);
        let existing: Vec<Favorite> = backend
            .select(&membership.clone().limit(1))
            .await
            .map_err(|err| write_failed(kind, err))?;

        let favorited = if existing.is_empty() {
            backend
                .insert::<Favorite, _>(&NewFavorite {
                    user_id: user.id,
                    product_id,
                })
                .await
                .map_err(|err| write_failed(kind, err))?;
            true
        } else {
            backend
                .delete::<Favorite>(&membership)
                .await
                .map_err(|err| write_failed(kind, err))?;
            false
        };

        self.complete(kind, MutationContext::user(user.id).with_product(product_id))
            .await;
        Ok(favorited)
    }
}
