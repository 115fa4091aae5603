//! The stock ledger: atomic counter plus append-only audit trail.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use prickly_pear_core::{AccountId, ProductId, StockMovementId};

use super::RepositoryError;
use crate::models::{MovementKind, MovementView, ProductRow, StockMovement};

/// Filters for the inventory list screen.
#[derive(Debug, Clone, Default)]
pub struct InventoryFilter {
    /// Substring match on product name or slug.
    pub query: Option<String>,
    /// Only products at or below their restock threshold.
    pub low_stock: bool,
    /// Only products hidden from the storefront.
    pub unavailable: bool,
}

#[derive(sqlx::FromRow)]
struct MovementRow {
    id: i32,
    product_id: i32,
    kind: String,
    quantity: i32,
    reason: String,
    reference: String,
    account_id: Option<i32>,
    created_at: DateTime<Utc>,
    product_name: String,
}

impl MovementRow {
    fn into_view(self) -> Result<MovementView, RepositoryError> {
        let kind = MovementKind::from_str_opt(&self.kind).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("unknown movement kind: {}", self.kind))
        })?;

        Ok(MovementView {
            movement: StockMovement {
                id: StockMovementId::new(self.id),
                product_id: ProductId::new(self.product_id),
                kind,
                quantity: self.quantity,
                reason: self.reason,
                reference: self.reference,
                account_id: self.account_id.map(AccountId::new),
                created_at: self.created_at,
            },
            product_name: self.product_name,
        })
    }
}

/// Inventory access: the ledger write path and the warehouse read models.
pub struct InventoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InventoryRepository<'a> {
    /// Create a new inventory repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Apply a signed stock delta and record its audit movement, atomically.
    ///
    /// The counter update is a single `stock = stock + $delta` statement at
    /// the storage layer - never read-modify-write in application code - so
    /// concurrent adjusters cannot lose updates. The movement insert shares
    /// the transaction: if it fails, the counter change rolls back with it.
    ///
    /// Stock is allowed to go negative; whether a decrement was sensible is
    /// the caller's business rule, not the ledger's.
    ///
    /// Returns the stock value after the adjustment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn adjust_stock(
        &self,
        product_id: ProductId,
        delta: i32,
        kind: MovementKind,
        actor: Option<AccountId>,
        reason: &str,
        reference: &str,
    ) -> Result<i32, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "UPDATE shop.product \
             SET stock = stock + $1, updated_at = now() \
             WHERE id = $2 \
             RETURNING stock",
        )
        .bind(delta)
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Err(RepositoryError::NotFound);
        };
        let new_stock: i32 = row.try_get("stock")?;

        sqlx::query(
            "INSERT INTO shop.stock_movement \
                 (product_id, kind, quantity, reason, reference, account_id) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(product_id)
        .bind(kind.as_str())
        .bind(delta)
        .bind(reason)
        .bind(reference)
        .bind(actor)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(new_stock)
    }

    /// Get one product for the adjustment screen.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_product(
        &self,
        product_id: ProductId,
    ) -> Result<Option<ProductRow>, RepositoryError> {
        let product = sqlx::query_as::<_, ProductRow>(
            "SELECT id, category_id, supplier_id, name, slug, price, \
                    stock, stock_minimum, available \
             FROM shop.product WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Inventory list with search and low-stock / unavailable filters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(
        &self,
        filter: &InventoryFilter,
    ) -> Result<Vec<ProductRow>, RepositoryError> {
        let products = sqlx::query_as::<_, ProductRow>(
            "SELECT id, category_id, supplier_id, name, slug, price, \
                    stock, stock_minimum, available \
             FROM shop.product \
             WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%' \
                                     OR slug ILIKE '%' || $1 || '%') \
               AND (NOT $2 OR stock <= stock_minimum) \
               AND (NOT $3 OR NOT available) \
             ORDER BY name",
        )
        .bind(filter.query.as_deref())
        .bind(filter.low_stock)
        .bind(filter.unavailable)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Movement list, newest first, optionally filtered by a substring on
    /// product name, reference, or reason.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` for an unknown stored kind.
    pub async fn list_movements(
        &self,
        query: Option<&str>,
    ) -> Result<Vec<MovementView>, RepositoryError> {
        let rows = sqlx::query_as::<_, MovementRow>(
            "SELECT m.id, m.product_id, m.kind, m.quantity, m.reason, \
                    m.reference, m.account_id, m.created_at, \
                    p.name AS product_name \
             FROM shop.stock_movement m \
             JOIN shop.product p ON p.id = m.product_id \
             WHERE ($1::text IS NULL OR p.name ILIKE '%' || $1 || '%' \
                                     OR m.reference ILIKE '%' || $1 || '%' \
                                     OR m.reason ILIKE '%' || $1 || '%') \
             ORDER BY m.created_at DESC",
        )
        .bind(query)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(MovementRow::into_view).collect()
    }
}
