//! Order persistence.
//!
//! Order + lines creation is a single transaction: either the whole
//! checkout lands or none of it does. The paid transition is a conditional
//! update so replayed settlement events cannot fire side effects twice.

use sqlx::PgPool;

use prickly_pear_core::{AccountId, OrderId};

use super::RepositoryError;
use crate::models::{NewOrder, NewOrderLine, Order, OrderLineView, OrderWithLines};

const ORDER_COLUMNS: &str = "id, account_id, name, last_name, second_last_name, email, \
     address, postal_code, city, created_at, updated_at, paid, \
     payment_reference, coupon_id, discount_percent";

/// Outcome of the paid-flag transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkPaidOutcome {
    /// This call flipped the order from pending to paid. Side effects
    /// (recommendations, invoice job, user back-fill) run exactly once,
    /// on this outcome only.
    Transitioned,
    /// The order was already paid; the event is a duplicate and a no-op.
    AlreadyPaid,
    /// No order with that id exists.
    NotFound,
}

/// Order persistence for the storefront.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an order with its lines in one transaction.
    ///
    /// Line prices and the discount percent arrive already snapshotted in
    /// the inputs; nothing here reads the live product or coupon tables.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any insert fails; the
    /// transaction rolls back and no partial order remains.
    pub async fn create(
        &self,
        order: &NewOrder,
        lines: &[NewOrderLine],
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO shop.\"order\" \
                 (account_id, name, last_name, second_last_name, email, \
                  address, postal_code, city, coupon_id, discount_percent) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order.account_id)
        .bind(&order.name)
        .bind(&order.last_name)
        .bind(&order.second_last_name)
        .bind(&order.email)
        .bind(&order.address)
        .bind(&order.postal_code)
        .bind(&order.city)
        .bind(order.coupon_id)
        .bind(order.discount_percent)
        .fetch_one(&mut *tx)
        .await?;

        for line in lines {
            sqlx::query(
                "INSERT INTO shop.order_line (order_id, product_id, unit_price, quantity) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(created.id)
            .bind(line.product_id)
            .bind(line.unit_price)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(created)
    }

    /// Get an order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_with_lines(
        &self,
        id: OrderId,
    ) -> Result<Option<OrderWithLines>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.\"order\" WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(order) = order else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, OrderLineView>(
            "SELECT l.product_id, p.name AS product_name, l.unit_price, l.quantity \
             FROM shop.order_line l \
             JOIN shop.product p ON p.id = l.product_id \
             WHERE l.order_id = $1 \
             ORDER BY l.id",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(OrderWithLines { order, lines }))
    }

    /// Flip the paid flag, exactly once.
    ///
    /// The update is conditional on `paid = FALSE`, so under at-least-once
    /// event delivery only one caller observes [`MarkPaidOutcome::Transitioned`].
    /// The payment reference is written on that same transition and never
    /// touched again.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn mark_paid(
        &self,
        id: OrderId,
        payment_reference: &str,
    ) -> Result<MarkPaidOutcome, RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.\"order\" \
             SET paid = TRUE, payment_reference = $2, updated_at = now() \
             WHERE id = $1 AND paid = FALSE",
        )
        .bind(id)
        .bind(payment_reference)
        .execute(self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(MarkPaidOutcome::Transitioned);
        }

        // Nothing updated: either the order is already paid or it is gone.
        let row = sqlx::query("SELECT paid FROM shop.\"order\" WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(_) => Ok(MarkPaidOutcome::AlreadyPaid),
            None => Ok(MarkPaidOutcome::NotFound),
        }
    }

    /// Attach an owning account to a guest order.
    ///
    /// Used by settlement to back-fill ownership when the payer email
    /// matches an existing account. Only fills a missing owner; an order
    /// that already has one is left alone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn attach_account(
        &self,
        id: OrderId,
        account_id: AccountId,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE shop.\"order\" SET account_id = $2, updated_at = now() \
             WHERE id = $1 AND account_id IS NULL",
        )
        .bind(id)
        .bind(account_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
