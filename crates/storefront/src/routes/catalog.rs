//! Catalog route handlers: categories, product lists, product detail.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use prickly_pear_core::ProductId;

use crate::db::{ProductRepository, RecommendationRepository};
use crate::error::{AppError, Result};
use crate::models::{Category, Product};
use crate::state::AppState;

/// How many "bought together" products a detail page shows.
const MAX_SUGGESTIONS: i64 = 6;

/// Build the catalog router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(categories))
        .route("/products", get(list))
        .route("/products/{id}", get(detail))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Restrict to one category slug.
    pub category: Option<String>,
}

/// Product detail plus its co-purchase suggestions.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    pub product: Product,
    /// Ranked by descending co-purchase score.
    pub bought_together: Vec<Product>,
}

/// GET /categories - active categories.
#[instrument(skip(state))]
async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = ProductRepository::new(state.pool()).list_categories().await?;
    Ok(Json(categories))
}

/// GET /products - available products, optionally by category.
#[instrument(skip(state))]
async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool())
        .list_available(params.category.as_deref())
        .await?;
    Ok(Json(products))
}

/// GET /products/{id} - one product with its suggestions.
#[instrument(skip(state))]
async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductDetail>> {
    let id = ProductId::new(id);
    let product = ProductRepository::new(state.pool())
        .get_available(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let bought_together = RecommendationRepository::new(state.pool())
        .suggest(&[id], MAX_SUGGESTIONS)
        .await?;

    Ok(Json(ProductDetail {
        product,
        bought_together,
    }))
}
