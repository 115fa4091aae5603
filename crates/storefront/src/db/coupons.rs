//! Coupon lookups.
//!
//! Absence of a redeemable coupon is a normal outcome, not an error -
//! every method returns `Option<Coupon>` and callers branch on `None`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use prickly_pear_core::CouponId;

use super::RepositoryError;
use crate::models::Coupon;

/// Read-only coupon access for the storefront.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find a coupon by code that is redeemable at `now`.
    ///
    /// The code comparison is case-insensitive and exact; the validity
    /// window is inclusive on both ends and `active` must be set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_redeemable(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Coupon>, RepositoryError> {
        let coupon = sqlx::query_as::<_, Coupon>(
            "SELECT id, code, valid_from, valid_until, discount_percent, active \
             FROM shop.coupon \
             WHERE lower(code) = lower($1) \
               AND active \
               AND valid_from <= $2 \
               AND valid_until >= $2",
        )
        .bind(code)
        .bind(now)
        .fetch_optional(self.pool)
        .await?;

        Ok(coupon)
    }

    /// Re-validate a previously attached coupon id.
    ///
    /// A coupon can expire or be deactivated between cart operations, so
    /// this is called on every access rather than caching the first answer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_redeemable(
        &self,
        id: CouponId,
        now: DateTime<Utc>,
    ) -> Result<Option<Coupon>, RepositoryError> {
        let coupon = sqlx::query_as::<_, Coupon>(
            "SELECT id, code, valid_from, valid_until, discount_percent, active \
             FROM shop.coupon \
             WHERE id = $1 \
               AND active \
               AND valid_from <= $2 \
               AND valid_until >= $2",
        )
        .bind(id)
        .bind(now)
        .fetch_optional(self.pool)
        .await?;

        Ok(coupon)
    }
}
