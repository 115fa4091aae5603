//! Integration tests for Prickly Pear Commerce.
//!
//! These tests run against a real `PostgreSQL` and are `#[ignore]`d by
//! default so `cargo test` stays green without infrastructure.
//!
//! # Running
//!
//! ```bash
//! # Point at a disposable database
//! export TEST_DATABASE_URL=postgres://localhost/prickly_pear_test
//!
//! cargo test -p prickly-pear-integration-tests -- --ignored
//! ```
//!
//! Every helper seeds rows with unique identifiers, so tests can share one
//! database and re-run without cleanup.

use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use prickly_pear_core::ProductId;

/// Shared context: a pool against the test database with migrations applied.
pub struct TestContext {
    /// Connection pool for repositories under test.
    pub pool: PgPool,
}

impl TestContext {
    /// Connect and migrate.
    ///
    /// # Panics
    ///
    /// Panics if no test database is reachable - these tests are opt-in
    /// and expect provisioned infrastructure.
    #[allow(clippy::expect_used)]
    pub async fn new() -> Self {
        let _ = dotenvy::dotenv();
        let url = std::env::var("TEST_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .expect("TEST_DATABASE_URL or DATABASE_URL must be set");

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .expect("failed to connect to the test database");

        sqlx::migrate!("../storefront/migrations")
            .run(&pool)
            .await
            .expect("failed to run migrations");

        Self { pool }
    }

    /// Insert a product (with its own supplier and category) and return its id.
    ///
    /// # Panics
    ///
    /// Panics on database errors; test setup has no fallback.
    #[allow(clippy::expect_used)]
    pub async fn seed_product(&self, price: Decimal, stock: i32) -> ProductId {
        let tag = Uuid::new_v4().simple().to_string();

        let supplier_id: i32 = sqlx::query_scalar(
            "INSERT INTO shop.supplier (company_name, tax_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(format!("supplier-{tag}"))
        .bind(format!("tax-{tag}"))
        .fetch_one(&self.pool)
        .await
        .expect("seed supplier");

        let category_id: i32 = sqlx::query_scalar(
            "INSERT INTO shop.category (name, slug) VALUES ($1, $2) RETURNING id",
        )
        .bind(format!("category-{tag}"))
        .bind(format!("category-{tag}"))
        .fetch_one(&self.pool)
        .await
        .expect("seed category");

        let id: i32 = sqlx::query_scalar(
            "INSERT INTO shop.product \
                 (category_id, supplier_id, name, slug, price, stock) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(category_id)
        .bind(supplier_id)
        .bind(format!("product-{tag}"))
        .bind(format!("product-{tag}"))
        .bind(price)
        .bind(stock)
        .fetch_one(&self.pool)
        .await
        .expect("seed product");

        ProductId::new(id)
    }

    /// Unique throwaway email for account tests.
    #[must_use]
    pub fn unique_email(&self) -> String {
        format!("test-{}@example.com", Uuid::new_v4().simple())
    }
}
