//! Inventory analytics: global metrics and per-supplier aggregates.
//!
//! Everything here is one `GROUP BY` away from the product table; nothing
//! is cached or materialized at this scale.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use prickly_pear_core::{SupplierId, quantize};

use super::RepositoryError;

/// Global inventory metrics for the dashboard.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InventoryMetrics {
    /// Sum of `price * stock` over every product.
    #[serde(with = "rust_decimal::serde::str")]
    pub total_stock_value: Decimal,
    /// Total units on hand.
    pub total_units: i64,
    /// Mean product price.
    #[serde(with = "rust_decimal::serde::str")]
    pub average_price: Decimal,
    /// Products at or below their restock threshold.
    pub below_minimum: i64,
}

/// Per-supplier aggregates.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SupplierStats {
    /// Supplier ID.
    pub id: SupplierId,
    /// Supplier company name.
    pub company_name: String,
    /// Number of products sourced from this supplier.
    pub total_products: i64,
    /// Products with stock on hand.
    pub products_in_stock: i64,
    /// Sum of `price * stock` over this supplier's products.
    #[serde(with = "rust_decimal::serde::str")]
    pub stock_value: Decimal,
    /// Mean price of this supplier's products.
    #[serde(with = "rust_decimal::serde::str")]
    pub average_price: Decimal,
}

/// Read-only analytics queries.
pub struct AnalyticsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AnalyticsRepository<'a> {
    /// Create a new analytics repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Global inventory metrics.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn inventory_metrics(&self) -> Result<InventoryMetrics, RepositoryError> {
        let mut metrics = sqlx::query_as::<_, InventoryMetrics>(
            "SELECT COALESCE(SUM(price * stock), 0)            AS total_stock_value, \
                    COALESCE(SUM(stock), 0)::bigint            AS total_units, \
                    COALESCE(AVG(price), 0)                    AS average_price, \
                    COUNT(*) FILTER (WHERE stock <= stock_minimum) AS below_minimum \
             FROM shop.product",
        )
        .fetch_one(self.pool)
        .await?;

        metrics.total_stock_value = quantize(metrics.total_stock_value);
        metrics.average_price = quantize(metrics.average_price);
        Ok(metrics)
    }

    /// Per-supplier aggregates, largest stock value first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn supplier_stats(&self) -> Result<Vec<SupplierStats>, RepositoryError> {
        let mut stats = sqlx::query_as::<_, SupplierStats>(
            "SELECT s.id, s.company_name, \
                    COUNT(p.id)                                 AS total_products, \
                    COUNT(p.id) FILTER (WHERE p.stock > 0)      AS products_in_stock, \
                    COALESCE(SUM(p.price * p.stock), 0)         AS stock_value, \
                    COALESCE(AVG(p.price), 0)                   AS average_price \
             FROM shop.supplier s \
             LEFT JOIN shop.product p ON p.supplier_id = s.id \
             GROUP BY s.id, s.company_name \
             ORDER BY stock_value DESC",
        )
        .fetch_all(self.pool)
        .await?;

        for row in &mut stats {
            row.stock_value = quantize(row.stock_value);
            row.average_price = quantize(row.average_price);
        }
        Ok(stats)
    }
}
