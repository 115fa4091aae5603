//! Route handlers for the storefront.
//!
//! Every surface is JSON; rendering is a client concern. Handlers stay
//! thin: load session state, call repositories, map domain outcomes onto
//! status codes via `AppError`.

use axum::Router;

use crate::state::AppState;

pub mod account;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod payments;

/// Build the full storefront router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(catalog::router())
        .merge(cart::router())
        .merge(account::router())
        .merge(checkout::router())
        .merge(payments::router())
}
