//! Cart route handlers.
//!
//! The cart is loaded from the session at the top of each handler, mutated
//! in memory, and explicitly saved back - the save is what marks the
//! session modified. Coupon problems degrade silently to "no discount";
//! they are never a hard failure for the shopper.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use prickly_pear_core::ProductId;

use crate::cart::{self, Cart, CartItem, CartTotals};
use crate::db::{CouponRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Build the cart router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cart", get(show).delete(clear))
        .route("/cart/items", post(add))
        .route("/cart/items/{product_id}", delete(remove))
        .route("/cart/coupon", post(apply_coupon))
}

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddForm {
    pub product_id: i32,
    /// Defaults to 1.
    pub quantity: Option<u32>,
    /// Replace the existing quantity instead of adding to it.
    #[serde(default)]
    pub replace: bool,
}

/// Apply-coupon request body.
#[derive(Debug, Deserialize)]
pub struct CouponForm {
    pub code: String,
}

/// Full cart view for the client.
#[derive(Debug, Serialize)]
pub struct CartSummary {
    pub items: Vec<CartItem>,
    pub count: u32,
    pub totals: CartTotals,
    /// Code of the attached coupon, only when it is still redeemable.
    pub coupon_code: Option<String>,
}

/// Small response for mutations that only need the badge count.
#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u32,
}

async fn summarize(state: &AppState, cart: &Cart) -> Result<CartSummary> {
    let products = ProductRepository::new(state.pool());
    let coupons = CouponRepository::new(state.pool());

    let items = cart.hydrate(&products).await?;
    let coupon = cart.attached_coupon(&coupons, Utc::now()).await?;
    let totals = CartTotals::compute(cart.subtotal(), coupon.as_ref());

    Ok(CartSummary {
        items,
        count: cart.count(),
        totals,
        coupon_code: coupon.map(|c| c.code),
    })
}

/// GET /cart - the hydrated cart with totals.
#[instrument(skip(state, session))]
async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartSummary>> {
    let cart = cart::load(&session).await;
    Ok(Json(summarize(&state, &cart).await?))
}

/// POST /cart/items - add a product.
#[instrument(skip(state, session))]
async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<AddForm>,
) -> Result<Json<CartCount>> {
    let quantity = form.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(AppError::BadRequest("quantity must be at least 1".into()));
    }

    let product = ProductRepository::new(state.pool())
        .get_available(ProductId::new(form.product_id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", form.product_id)))?;

    let mut cart = cart::load(&session).await;
    cart.add(&product, quantity, form.replace);
    cart::save(&session, &cart).await?;

    Ok(Json(CartCount { count: cart.count() }))
}

/// DELETE /cart/items/{product_id} - remove a product.
///
/// Removing something that is not in the cart is fine; the session is only
/// rewritten when an entry was actually deleted.
#[instrument(skip(session))]
async fn remove(session: Session, Path(product_id): Path<i32>) -> Result<Json<CartCount>> {
    let mut cart = cart::load(&session).await;
    if cart.remove(ProductId::new(product_id)) {
        cart::save(&session, &cart).await?;
    }

    Ok(Json(CartCount { count: cart.count() }))
}

/// POST /cart/coupon - validate a code and attach or clear the coupon.
///
/// An unknown, expired, or inactive code clears any previously attached
/// coupon and the summary comes back without a discount - not an error.
#[instrument(skip(state, session))]
async fn apply_coupon(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<CouponForm>,
) -> Result<Json<CartSummary>> {
    let coupon = CouponRepository::new(state.pool())
        .find_redeemable(&form.code, Utc::now())
        .await?;

    let mut cart = cart::load(&session).await;
    cart.set_coupon(coupon.map(|c| c.id));
    cart::save(&session, &cart).await?;

    Ok(Json(summarize(&state, &cart).await?))
}

/// DELETE /cart - drop the whole cart.
#[instrument(skip(session))]
async fn clear(session: Session) -> Result<StatusCode> {
    cart::clear(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}
