//! Warehouse screens: inventory list, stock adjustment, movement trail.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use prickly_pear_core::ProductId;

use crate::auth::{Resource, require};
use crate::db::{InventoryFilter, InventoryRepository};
use crate::error::{AppError, Result};
use crate::models::{MovementKind, MovementView, ProductRow};
use crate::state::AppState;

/// Build the inventory router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(list))
        .route("/inventory/movements", get(movements))
        .route("/inventory/{id}/adjust", post(adjust))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Substring search on name or slug.
    pub q: Option<String>,
    /// `low` narrows to restock candidates, `unavailable` to hidden ones.
    pub filter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MovementParams {
    pub q: Option<String>,
}

/// Stock adjustment request body.
#[derive(Debug, Deserialize)]
pub struct AdjustForm {
    pub kind: MovementKind,
    /// Magnitude for inbound/outbound; signed value for adjustments.
    pub quantity: i32,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
}

/// Result of a stock adjustment.
#[derive(Debug, Serialize)]
pub struct AdjustResult {
    pub product_id: ProductId,
    /// Stock after the adjustment.
    pub stock: i32,
    pub needs_restock: bool,
}

/// GET /inventory - product list with filters.
#[instrument(skip(state, session))]
async fn list(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ProductRow>>> {
    require(&session, Resource::Inventory).await?;

    let filter = InventoryFilter {
        query: params.q.filter(|q| !q.is_empty()),
        low_stock: params.filter.as_deref() == Some("low"),
        unavailable: params.filter.as_deref() == Some("unavailable"),
    };

    let products = InventoryRepository::new(state.pool())
        .list_products(&filter)
        .await?;
    Ok(Json(products))
}

/// GET /inventory/movements - the audit trail, newest first.
#[instrument(skip(state, session))]
async fn movements(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<MovementParams>,
) -> Result<Json<Vec<MovementView>>> {
    require(&session, Resource::Inventory).await?;

    let movements = InventoryRepository::new(state.pool())
        .list_movements(params.q.as_deref().filter(|q| !q.is_empty()))
        .await?;
    Ok(Json(movements))
}

/// POST /inventory/{id}/adjust - apply a stock delta through the ledger.
///
/// The ledger itself lets stock go negative; the business rule that an
/// outbound movement must not exceed what is on hand lives here, at the
/// caller.
#[instrument(skip(state, session))]
async fn adjust(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Json(form): Json<AdjustForm>,
) -> Result<Json<AdjustResult>> {
    let staff = require(&session, Resource::Inventory).await?;

    if form.quantity == 0 {
        return Err(AppError::BadRequest("quantity must not be zero".to_owned()));
    }

    let product_id = ProductId::new(id);
    let repo = InventoryRepository::new(state.pool());

    let product = repo
        .get_product(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let delta = form.kind.signed_delta(form.quantity);
    if form.kind == MovementKind::Outbound && -delta > product.stock {
        return Err(AppError::BadRequest(format!(
            "cannot remove {} units, only {} on hand",
            -delta, product.stock
        )));
    }

    let stock = repo
        .adjust_stock(
            product_id,
            delta,
            form.kind,
            Some(staff.id),
            form.reason.as_deref().unwrap_or(""),
            form.reference.as_deref().unwrap_or(""),
        )
        .await?;

    tracing::info!(%product_id, delta, kind = form.kind.as_str(), "stock adjusted");

    Ok(Json(AdjustResult {
        product_id,
        stock,
        needs_restock: stock <= product.stock_minimum,
    }))
}
