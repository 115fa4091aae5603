//! Co-purchase recommendation index.
//!
//! Scores live in `shop.co_purchase` as `(product_id, with_product_id) ->
//! score`. Increments are per-pair atomic upserts, so concurrent
//! settlements touching overlapping products never lose counts. The
//! suggestion query is a single aggregate - there is no scratch state to
//! clean up, even on failure.

use sqlx::{PgPool, Row};

use prickly_pear_core::ProductId;

use super::RepositoryError;
use crate::models::Product;

/// Read/write access to the co-purchase score table.
pub struct RecommendationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RecommendationRepository<'a> {
    /// Create a new recommendation repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record that `products` were bought together.
    ///
    /// Every unordered pair of distinct products gains 1, symmetrically:
    /// recording {A,B,C} bumps A-B, A-C and B-C. Repeat purchases call this
    /// again and strengthen the association.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if an upsert fails.
    pub async fn record_co_purchase(&self, products: &[ProductId]) -> Result<(), RepositoryError> {
        for (index, &a) in products.iter().enumerate() {
            for &b in products.iter().skip(index + 1) {
                if a == b {
                    continue;
                }
                self.bump(a, b).await?;
                self.bump(b, a).await?;
            }
        }

        Ok(())
    }

    /// Atomic score increment for one directed pair.
    async fn bump(&self, product: ProductId, with: ProductId) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO shop.co_purchase (product_id, with_product_id, score) \
             VALUES ($1, $2, 1) \
             ON CONFLICT (product_id, with_product_id) \
             DO UPDATE SET score = shop.co_purchase.score + 1",
        )
        .bind(product)
        .bind(with)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Products most often bought together with `products`.
    ///
    /// Scores are summed across the input set, the inputs themselves are
    /// excluded, and the result is hydrated to products in descending
    /// combined-score order. The by-id hydration query does not preserve
    /// order, so rows are re-sorted against the ranked id list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn suggest(
        &self,
        products: &[ProductId],
        limit: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        if products.is_empty() || limit <= 0 {
            return Ok(Vec::new());
        }

        let raw: Vec<i32> = products.iter().map(|id| id.as_i32()).collect();
        let rows = sqlx::query(
            "SELECT with_product_id, SUM(score) AS combined \
             FROM shop.co_purchase \
             WHERE product_id = ANY($1) AND NOT (with_product_id = ANY($1)) \
             GROUP BY with_product_id \
             ORDER BY combined DESC \
             LIMIT $2",
        )
        .bind(&raw)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        let ranked: Vec<ProductId> = rows
            .iter()
            .map(|row| row.try_get::<i32, _>("with_product_id").map(ProductId::new))
            .collect::<Result<_, _>>()?;

        let mut suggested = super::ProductRepository::new(self.pool)
            .get_by_ids(&ranked)
            .await?;
        suggested.sort_by_key(|product| {
            ranked
                .iter()
                .position(|&id| id == product.id)
                .unwrap_or(usize::MAX)
        });

        Ok(suggested)
    }

    /// Administrative reset: drop every co-purchase score.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn forget_all(&self) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM shop.co_purchase")
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
