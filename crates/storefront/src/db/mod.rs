//! Database operations for the storefront `PostgreSQL`.
//!
//! # Schema: `shop`
//!
//! One database is shared with the admin binary:
//!
//! - `account` / `account_password` - customers and staff
//! - `supplier`, `category`, `product` - catalog
//! - `coupon` - discount codes
//! - `"order"` / `order_line` - checkouts with frozen prices
//! - `stock_movement` - append-only inventory audit trail
//! - `co_purchase` - recommendation index scores
//!
//! # Migrations
//!
//! Migrations live in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p prickly-pear-cli -- migrate
//! ```
//!
//! All queries use the runtime sqlx API (`query`/`query_as`), so the
//! workspace builds without a live database.

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub mod coupons;
pub mod orders;
pub mod products;
pub mod recommendations;
pub mod users;

pub use coupons::CouponRepository;
pub use orders::{MarkPaidOutcome, OrderRepository};
pub use products::ProductRepository;
pub use recommendations::RecommendationRepository;
pub use users::AccountRepository;

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A uniqueness or foreign-key expectation was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The referenced row does not exist.
    #[error("not found")]
    NotFound,

    /// A stored value failed to parse back into its domain type.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
