//! Checkout: turn the session cart into a persisted order.
//!
//! The order + lines insert is atomic in the repository; clearing the cart
//! and enqueueing the confirmation mail happen after commit and are
//! best-effort - their failure cannot un-create the order.

use std::collections::BTreeMap;

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use prickly_pear_core::{Email, OrderId};

use crate::cart::{self, CartTotals};
use crate::db::{CouponRepository, OrderRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::models::{NewOrder, NewOrderLine, session_keys};
use crate::state::AppState;
use crate::tasks::Job;

use super::account::current_user;

/// Build the checkout router.
pub fn router() -> Router<AppState> {
    Router::new().route("/checkout", post(create_order))
}

/// Customer details submitted at checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutForm {
    pub name: String,
    pub last_name: String,
    #[serde(default)]
    pub second_last_name: Option<String>,
    pub email: String,
    pub address: String,
    pub postal_code: String,
    pub city: String,
}

impl CheckoutForm {
    /// Presence/format validation; per-field messages, nothing mutated yet.
    fn validate(&self) -> std::result::Result<(), BTreeMap<&'static str, String>> {
        let mut errors = BTreeMap::new();

        for (field, value) in [
            ("name", &self.name),
            ("last_name", &self.last_name),
            ("address", &self.address),
            ("postal_code", &self.postal_code),
            ("city", &self.city),
        ] {
            if value.trim().is_empty() {
                errors.insert(field, "this field is required".to_owned());
            }
        }

        if let Err(e) = Email::parse(self.email.trim()) {
            errors.insert("email", e.to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Response for a created order.
#[derive(Debug, Serialize)]
pub struct OrderCreated {
    pub order_id: OrderId,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
}

/// POST /checkout - create the order from the session cart.
#[instrument(skip(state, session, form))]
async fn create_order(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<CheckoutForm>,
) -> Result<(StatusCode, Json<OrderCreated>)> {
    form.validate().map_err(AppError::Validation)?;

    let cart = cart::load(&session).await;
    if cart.is_empty() {
        return Err(AppError::BadRequest("cart is empty".to_owned()));
    }

    let products = ProductRepository::new(state.pool());
    let coupons = CouponRepository::new(state.pool());

    // Hydrate first: only products that still exist become order lines.
    let items = cart.hydrate(&products).await?;
    if items.is_empty() {
        return Err(AppError::BadRequest(
            "no purchasable products left in cart".to_owned(),
        ));
    }

    // Account identity is authoritative over the form when signed in.
    let user = current_user(&session).await;
    let email = user
        .as_ref()
        .map_or_else(|| form.email.trim().to_owned(), |u| u.email.to_string());

    // Snapshot the discount percent now; later coupon edits must not
    // reach this order.
    let coupon = cart.attached_coupon(&coupons, Utc::now()).await?;

    let new_order = NewOrder {
        account_id: user.map(|u| u.id),
        name: form.name.trim().to_owned(),
        last_name: form.last_name.trim().to_owned(),
        second_last_name: form
            .second_last_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned),
        email,
        address: form.address.trim().to_owned(),
        postal_code: form.postal_code.trim().to_owned(),
        city: form.city.trim().to_owned(),
        coupon_id: coupon.as_ref().map(|c| c.id),
        discount_percent: coupon.as_ref().map_or(0, |c| i32::from(c.percent())),
    };

    let lines: Vec<NewOrderLine> = items
        .iter()
        .map(|item| NewOrderLine {
            product_id: item.product.id,
            unit_price: item.unit_price,
            quantity: i32::try_from(item.quantity).unwrap_or(i32::MAX),
        })
        .collect();

    let order = OrderRepository::new(state.pool())
        .create(&new_order, &lines)
        .await?;

    // Post-commit side effects. The order exists now; none of these may
    // fail the request.
    if let Err(e) = cart::clear(&session).await {
        tracing::error!(order_id = %order.id, error = %e, "failed to clear cart after checkout");
    }
    if let Err(e) = session.insert(session_keys::PENDING_ORDER, order.id).await {
        tracing::error!(order_id = %order.id, error = %e, "failed to store pending order");
    }
    state.jobs().enqueue(Job::OrderCreated(order.id));

    // Total over the lines that actually became the order.
    let subtotal: Decimal = items.iter().map(|item| item.line_total).sum();
    let totals = CartTotals::compute(subtotal, coupon.as_ref());

    Ok((
        StatusCode::CREATED,
        Json(OrderCreated {
            order_id: order.id,
            total: totals.total,
        }),
    ))
}
