//! Guest checkout handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use tracing::instrument;

use fitsphere_core::{GuestOrderId, OrderNumber};

use crate::db::GuestOrderRepository;
use crate::error::{AppError, Result};
use crate::extract::{AppJson, AppPath};
use crate::middleware::RequireAdmin;
use crate::models::{GuestCheckoutRequest, GuestOrder, StatusUpdate};
use crate::services::orders::{OrderService, not_found, parse_status};
use crate::state::AppState;

/// Confirmation returned by guest checkout.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub success: bool,
    pub id: GuestOrderId,
    pub order_number: OrderNumber,
}

/// POST /api/guest-orders/checkout
#[instrument(skip(state, body))]
pub async fn checkout(
    State(state): State<AppState>,
    AppJson(body): AppJson<GuestCheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>)> {
    let order = OrderService::new(state.pool())
        .place_guest_order(&body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            success: true,
            id: order.id,
            order_number: order.order_number,
        }),
    ))
}

/// GET /api/guest-orders/{id}
pub async fn show(
    State(state): State<AppState>,
    AppPath(id): AppPath<GuestOrderId>,
) -> Result<Json<GuestOrder>> {
    GuestOrderRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}

/// All guest orders, newest first.
///
/// GET /api/guest-orders
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<GuestOrder>>> {
    let orders = GuestOrderRepository::new(state.pool())
        .list_recent(None)
        .await?;
    Ok(Json(orders))
}

/// PATCH /api/guest-orders/{id}/status
#[instrument(skip(state, admin, body), fields(admin = %admin.id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    AppPath(id): AppPath<GuestOrderId>,
    AppJson(body): AppJson<StatusUpdate>,
) -> Result<Json<GuestOrder>> {
    let status = parse_status(&body.status)?;

    let order = GuestOrderRepository::new(state.pool())
        .update_status(id, status)
        .await
        .map_err(not_found)?;

    tracing::info!(order_number = %order.order_number, %status, "Guest order status updated");
    Ok(Json(order))
}
