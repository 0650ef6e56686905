//! Product catalog handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use fitsphere_core::ProductId;

use crate::db::{ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::RequireAdmin;
use crate::models::{NewProduct, Product, ProductFilter, ProductUpdate};
use crate::state::AppState;

use super::MessageResponse;

/// Body of `PATCH /api/products/{id}/trendy`.
#[derive(Debug, Deserialize)]
pub struct TrendyUpdate {
    pub trendy: bool,
}

fn product_not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound("Product not found".to_string()),
        other => other.into(),
    }
}

/// List products, optionally filtered by category and trendiness.
///
/// GET /api/products
pub async fn index(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<ProductFilter>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list(filter).await?;
    Ok(Json(products))
}

/// GET /api/products/{id}
pub async fn show(
    State(state): State<AppState>,
    AppPath(id): AppPath<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

/// POST /api/products
#[instrument(skip(state, admin, body), fields(admin = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    AppJson(body): AppJson<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    body.validate()?;

    let product = ProductRepository::new(state.pool()).create(&body).await?;
    tracing::info!(product_id = %product.id, "Product created");

    Ok((StatusCode::CREATED, Json(product)))
}

/// Update the fields present in the body.
///
/// PUT /api/products/{id}
#[instrument(skip(state, _admin, body))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    AppPath(id): AppPath<ProductId>,
    AppJson(body): AppJson<ProductUpdate>,
) -> Result<Json<Product>> {
    body.validate()?;

    let product = ProductRepository::new(state.pool())
        .update(id, &body)
        .await
        .map_err(product_not_found)?;

    Ok(Json(product))
}

/// DELETE /api/products/{id}
#[instrument(skip(state, _admin))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    AppPath(id): AppPath<ProductId>,
) -> Result<Json<MessageResponse>> {
    if !ProductRepository::new(state.pool()).delete(id).await? {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    tracing::info!(product_id = %id, "Product deleted");
    Ok(Json(MessageResponse::new("Product deleted successfully")))
}

/// PATCH /api/products/{id}/trendy
pub async fn set_trendy(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    AppPath(id): AppPath<ProductId>,
    AppJson(body): AppJson<TrendyUpdate>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .set_trendy(id, body.trendy)
        .await
        .map_err(product_not_found)?;

    Ok(Json(product))
}
