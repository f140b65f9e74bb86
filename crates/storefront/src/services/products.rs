//! Catalog reads.

use tracing::instrument;

use haneul_core::{CategoryId, ProductId};

use super::{StoreError, Storefront};
use crate::backend::{Backend, BackendError, Filter};
use crate::models::{Category, Product};
use crate::query::QueryKey;

impl<B: Backend> Storefront<B> {
    /// Products for sale, newest first, optionally within one category.
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` without a backend, `Remote` if the read fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, category: Option<CategoryId>) -> Result<Vec<Product>, StoreError> {
        self.read(QueryKey::Products { category }, |backend| async move {
            let mut filter = Filter::new().eq("is_available", true);
            if let Some(category) = category {
                filter = filter.eq("category_id", category);
            }
            backend.select(&filter.order_desc("created_at")).await
        })
        .await
    }

    /// One product.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no product has this id.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, StoreError> {
        let product: Option<Product> = self
            .read(QueryKey::Product(id), |backend| async move {
                let rows: Vec<Product> = backend.select(&Filter::new().eq("id", id).limit(1)).await?;
                Ok::<_, BackendError>(rows.into_iter().next())
            })
            .await?;
        product.ok_or(StoreError::NotFound)
    }

    /// Every category, by name.
    ///
    /// # Errors
    ///
    /// Returns `Remote` if the read fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        self.read(QueryKey::Categories, |backend| async move {
            backend.select(&Filter::new().order_asc("name")).await
        })
        .await
    }
}
