//! Analytics dashboard for management.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::auth::{Resource, require};
use crate::db::AnalyticsRepository;
use crate::db::analytics::{InventoryMetrics, SupplierStats};
use crate::error::Result;
use crate::state::AppState;

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard/metrics", get(metrics))
        .route("/suppliers/stats", get(suppliers))
}

/// Combined dashboard payload.
#[derive(Debug, Serialize)]
pub struct DashboardMetrics {
    pub inventory: InventoryMetrics,
    pub suppliers: Vec<SupplierStats>,
}

/// GET /dashboard/metrics - global metrics plus per-supplier breakdown.
#[instrument(skip(state, session))]
async fn metrics(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<DashboardMetrics>> {
    require(&session, Resource::Dashboard).await?;

    let analytics = AnalyticsRepository::new(state.pool());
    let inventory = analytics.inventory_metrics().await?;
    let suppliers = analytics.supplier_stats().await?;

    Ok(Json(DashboardMetrics {
        inventory,
        suppliers,
    }))
}

/// GET /suppliers/stats - per-supplier aggregates on their own.
#[instrument(skip(state, session))]
async fn suppliers(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<SupplierStats>>> {
    require(&session, Resource::Suppliers).await?;

    let stats = AnalyticsRepository::new(state.pool())
        .supplier_stats()
        .await?;
    Ok(Json(stats))
}
