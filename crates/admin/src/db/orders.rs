//! Order read side for the staff panel.

use sqlx::PgPool;

use prickly_pear_core::OrderId;

use super::RepositoryError;
use crate::models::{AdminOrder, AdminOrderLine};

const ORDER_COLUMNS: &str = "id, account_id, name, last_name, email, city, \
     created_at, paid, payment_reference, coupon_id, discount_percent";

/// Read-only order access.
pub struct AdminOrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminOrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List orders, newest first. `unpaid_only` narrows to pending ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, unpaid_only: bool) -> Result<Vec<AdminOrder>, RepositoryError> {
        let orders = sqlx::query_as::<_, AdminOrder>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.\"order\" \
             WHERE (NOT $1 OR paid = FALSE) \
             ORDER BY created_at DESC"
        ))
        .bind(unpaid_only)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Get one order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_with_lines(
        &self,
        id: OrderId,
    ) -> Result<Option<(AdminOrder, Vec<AdminOrderLine>)>, RepositoryError> {
        let order = sqlx::query_as::<_, AdminOrder>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.\"order\" WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(order) = order else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, AdminOrderLine>(
            "SELECT l.product_id, p.name AS product_name, l.unit_price, l.quantity \
             FROM shop.order_line l \
             JOIN shop.product p ON p.id = l.product_id \
             WHERE l.order_id = $1 \
             ORDER BY l.id",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some((order, lines)))
    }
}
