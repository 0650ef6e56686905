//! Registered-user order handlers.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use fitsphere_core::{OrderId, UserId};

use crate::error::{AppError, Result};
use crate::extract::{AppJson, AppPath};
use crate::middleware::RequireUser;
use crate::models::{CheckoutRequest, Order, StatusUpdate, User};
use crate::services::orders::OrderService;
use crate::state::AppState;

/// Resolve the `{userId}` path segment, where `me` is the caller.
fn resolve_user_id(segment: &str, viewer: &User) -> Result<UserId> {
    if segment == "me" {
        return Ok(viewer.id);
    }
    segment
        .parse::<UserId>()
        .map_err(|_| AppError::BadRequest("Invalid user id".to_string()))
}

/// Orders of one user, newest first.
///
/// GET /api/orders/user/{userId}
pub async fn for_user(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
    AppPath(segment): AppPath<String>,
) -> Result<Json<Vec<Order>>> {
    let user_id = resolve_user_id(&segment, &viewer)?;
    let orders = OrderService::new(state.pool())
        .orders_for_user(&viewer, user_id)
        .await?;
    Ok(Json(orders))
}

/// Place an order for the signed-in user.
///
/// POST /api/orders
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    AppJson(body): AppJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = OrderService::new(state.pool())
        .place_order(user.id, &body)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// PATCH /api/orders/{orderId}/status
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    AppPath(order_id): AppPath<OrderId>,
    AppJson(body): AppJson<StatusUpdate>,
) -> Result<Json<Order>> {
    let order = OrderService::new(state.pool())
        .update_status(&user, order_id, &body.status)
        .await?;
    Ok(Json(order))
}
