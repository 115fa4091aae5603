//! Stock ledger properties against a real database.
//!
//! Run with `cargo test -p prickly-pear-integration-tests -- --ignored`
//! and a `TEST_DATABASE_URL` pointing at a disposable `PostgreSQL`.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;

use prickly_pear_admin::db::InventoryRepository;
use prickly_pear_admin::models::MovementKind;
use prickly_pear_integration_tests::TestContext;

#[tokio::test]
#[ignore = "needs a provisioned test database"]
async fn concurrent_adjustments_settle_deterministically() {
    let ctx = TestContext::new().await;
    let product_id = ctx.seed_product(Decimal::new(999, 2), 10).await;

    // +5 and -3 race from two connections; the atomic increment means the
    // interleaving cannot matter.
    let pool_a = ctx.pool.clone();
    let pool_b = ctx.pool.clone();
    let inbound = tokio::spawn(async move {
        InventoryRepository::new(&pool_a)
            .adjust_stock(product_id, 5, MovementKind::Inbound, None, "delivery", "")
            .await
    });
    let outbound = tokio::spawn(async move {
        InventoryRepository::new(&pool_b)
            .adjust_stock(product_id, -3, MovementKind::Outbound, None, "pick", "")
            .await
    });

    inbound.await.unwrap().unwrap();
    outbound.await.unwrap().unwrap();

    let stock: i32 = sqlx::query_scalar("SELECT stock FROM shop.product WHERE id = $1")
        .bind(product_id)
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(stock, 12);

    let movements: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM shop.stock_movement WHERE product_id = $1")
            .bind(product_id)
            .fetch_one(&ctx.pool)
            .await
            .unwrap();
    assert_eq!(movements, 2);
}

#[tokio::test]
#[ignore = "needs a provisioned test database"]
async fn ledger_records_negative_stock() {
    let ctx = TestContext::new().await;
    let product_id = ctx.seed_product(Decimal::new(999, 2), 10).await;

    // The ledger itself does not clamp; the floor rule lives in callers.
    let stock = InventoryRepository::new(&ctx.pool)
        .adjust_stock(
            product_id,
            -25,
            MovementKind::Adjustment,
            None,
            "inventory correction",
            "",
        )
        .await
        .unwrap();

    assert_eq!(stock, -15);
}

#[tokio::test]
#[ignore = "needs a provisioned test database"]
async fn adjusting_missing_product_is_not_found() {
    let ctx = TestContext::new().await;

    let result = InventoryRepository::new(&ctx.pool)
        .adjust_stock(
            prickly_pear_core::ProductId::new(i32::MAX),
            1,
            MovementKind::Inbound,
            None,
            "",
            "",
        )
        .await;

    assert!(matches!(
        result,
        Err(prickly_pear_admin::db::RepositoryError::NotFound)
    ));
}
