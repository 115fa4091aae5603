//! Product and category read access for the storefront.

use sqlx::PgPool;

use prickly_pear_core::ProductId;

use super::RepositoryError;
use crate::models::{Category, Product};

/// Read-only catalog access.
///
/// The storefront never mutates products; stock changes go through the
/// admin stock ledger.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List active categories, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, active FROM shop.category WHERE active ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// List available products, optionally within one category slug,
    /// ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_available(
        &self,
        category_slug: Option<&str>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = match category_slug {
            Some(slug) => {
                sqlx::query_as::<_, Product>(
                    "SELECT p.* FROM shop.product p \
                     JOIN shop.category c ON c.id = p.category_id \
                     WHERE p.available AND c.active AND c.slug = $1 \
                     ORDER BY p.name",
                )
                .bind(slug)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Product>(
                    "SELECT * FROM shop.product WHERE available ORDER BY name",
                )
                .fetch_all(self.pool)
                .await?
            }
        };

        Ok(products)
    }

    /// Get one available product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_available(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product =
            sqlx::query_as::<_, Product>("SELECT * FROM shop.product WHERE id = $1 AND available")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(product)
    }

    /// Batched lookup by id set. Ids with no matching row are simply not in
    /// the result; the caller decides whether that matters.
    ///
    /// Row order is unspecified - callers that care about order re-sort
    /// against their own id list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let raw: Vec<i32> = ids.iter().map(|id| id.as_i32()).collect();
        let products = sqlx::query_as::<_, Product>("SELECT * FROM shop.product WHERE id = ANY($1)")
            .bind(&raw)
            .fetch_all(self.pool)
            .await?;

        Ok(products)
    }
}
