//! Settlement and recommendation properties against a real database.
//!
//! Run with `cargo test -p prickly-pear-integration-tests -- --ignored`
//! and a `TEST_DATABASE_URL` pointing at a disposable `PostgreSQL`.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;

use prickly_pear_core::ProductId;
use prickly_pear_integration_tests::TestContext;
use prickly_pear_storefront::db::{
    MarkPaidOutcome, OrderRepository, RecommendationRepository,
};
use prickly_pear_storefront::models::{NewOrder, NewOrderLine};

fn guest_order(email: &str) -> NewOrder {
    NewOrder {
        account_id: None,
        name: "Ada".to_owned(),
        last_name: "Lovelace".to_owned(),
        second_last_name: None,
        email: email.to_owned(),
        address: "1 Analytical Way".to_owned(),
        postal_code: "28001".to_owned(),
        city: "Madrid".to_owned(),
        coupon_id: None,
        discount_percent: 0,
    }
}

#[tokio::test]
#[ignore = "needs a provisioned test database"]
async fn duplicate_settlement_transitions_exactly_once() {
    let ctx = TestContext::new().await;
    let product = ctx.seed_product(Decimal::new(1999, 2), 50).await;

    let orders = OrderRepository::new(&ctx.pool);
    let order = orders
        .create(
            &guest_order(&ctx.unique_email()),
            &[NewOrderLine {
                product_id: product,
                unit_price: Decimal::new(1999, 2),
                quantity: 2,
            }],
        )
        .await
        .unwrap();

    // At-least-once delivery: the same event lands twice. Only the first
    // call wins the conditional update; side effects key off that outcome.
    let first = orders.mark_paid(order.id, "pi_test_1").await.unwrap();
    let second = orders.mark_paid(order.id, "pi_test_1").await.unwrap();

    assert_eq!(first, MarkPaidOutcome::Transitioned);
    assert_eq!(second, MarkPaidOutcome::AlreadyPaid);

    let (paid, reference): (bool, Option<String>) = sqlx::query_as(
        "SELECT paid, payment_reference FROM shop.\"order\" WHERE id = $1",
    )
    .bind(order.id)
    .fetch_one(&ctx.pool)
    .await
    .unwrap();
    assert!(paid);
    assert_eq!(reference.as_deref(), Some("pi_test_1"));
}

#[tokio::test]
#[ignore = "needs a provisioned test database"]
async fn settling_missing_order_reports_not_found() {
    let ctx = TestContext::new().await;

    let outcome = OrderRepository::new(&ctx.pool)
        .mark_paid(prickly_pear_core::OrderId::new(i32::MAX), "pi_none")
        .await
        .unwrap();

    assert_eq!(outcome, MarkPaidOutcome::NotFound);
}

#[tokio::test]
#[ignore = "needs a provisioned test database"]
async fn order_lines_freeze_prices_at_creation() {
    let ctx = TestContext::new().await;
    let product = ctx.seed_product(Decimal::new(1999, 2), 50).await;

    let orders = OrderRepository::new(&ctx.pool);
    let order = orders
        .create(
            &guest_order(&ctx.unique_email()),
            &[NewOrderLine {
                product_id: product,
                unit_price: Decimal::new(1999, 2),
                quantity: 1,
            }],
        )
        .await
        .unwrap();

    // The live price changes after checkout; the order must not move.
    sqlx::query("UPDATE shop.product SET price = $1 WHERE id = $2")
        .bind(Decimal::new(9999, 2))
        .bind(product)
        .execute(&ctx.pool)
        .await
        .unwrap();

    let detail = orders.get_with_lines(order.id).await.unwrap().unwrap();
    assert_eq!(detail.lines[0].unit_price, Decimal::new(1999, 2));
    assert_eq!(detail.total(), Decimal::new(1999, 2));
}

#[tokio::test]
#[ignore = "needs a provisioned test database"]
async fn co_purchase_weights_rank_suggestions() {
    let ctx = TestContext::new().await;
    let a = ctx.seed_product(Decimal::new(100, 2), 10).await;
    let b = ctx.seed_product(Decimal::new(100, 2), 10).await;
    let c = ctx.seed_product(Decimal::new(100, 2), 10).await;

    let recs = RecommendationRepository::new(&ctx.pool);
    recs.record_co_purchase(&[a, b]).await.unwrap();
    recs.record_co_purchase(&[a, c]).await.unwrap();
    recs.record_co_purchase(&[a, c]).await.unwrap();

    let suggested = recs.suggest(&[a], 10).await.unwrap();
    let ids: Vec<ProductId> = suggested.iter().map(|p| p.id).collect();

    // C was bought with A twice, B once; A itself is excluded.
    assert_eq!(ids, vec![c, b]);

    // Symmetry: B's table gained the mirror increment.
    let suggested_for_b = recs.suggest(&[b], 10).await.unwrap();
    assert_eq!(suggested_for_b.first().map(|p| p.id), Some(a));
}
