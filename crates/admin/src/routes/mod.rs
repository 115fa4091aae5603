//! Route handlers for the staff panel.
//!
//! Every handler runs the authorization policy first via
//! [`crate::auth::require`], then does its work. Surfaces are JSON.

use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod dashboard;
pub mod inventory;
pub mod orders;

/// Build the full panel router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(inventory::router())
        .merge(orders::router())
}
