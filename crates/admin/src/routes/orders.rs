//! Order screens for sales staff.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use prickly_pear_core::OrderId;

use crate::auth::{Resource, require};
use crate::db::AdminOrderRepository;
use crate::error::{AppError, Result};
use crate::models::{AdminOrder, AdminOrderDetail};
use crate::state::AppState;

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list))
        .route("/orders/{id}", get(detail))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Narrow to orders still awaiting settlement.
    #[serde(default)]
    pub unpaid: bool,
}

/// GET /orders - newest first.
#[instrument(skip(state, session))]
async fn list(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<AdminOrder>>> {
    require(&session, Resource::Orders).await?;

    let orders = AdminOrderRepository::new(state.pool())
        .list(params.unpaid)
        .await?;
    Ok(Json(orders))
}

/// GET /orders/{id} - order detail with lines, totals, processor link.
#[instrument(skip(state, session))]
async fn detail(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<AdminOrderDetail>> {
    require(&session, Resource::Orders).await?;

    let id = OrderId::new(id);
    let (order, lines) = AdminOrderRepository::new(state.pool())
        .get_with_lines(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    Ok(Json(AdminOrderDetail::assemble(
        order,
        lines,
        state.config().payments_test_mode,
    )))
}
