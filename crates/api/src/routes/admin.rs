//! Back-office handlers. Every route requires an admin token.

use axum::{Json, extract::State};
use tracing::instrument;

use fitsphere_core::UserId;

use crate::error::Result;
use crate::extract::{AppJson, AppPath};
use crate::middleware::RequireAdmin;
use crate::models::{AdminOrderView, StatusUpdate};
use crate::services::admin::{AdminService, AdminStats, StatusChange};
use crate::state::AppState;

use super::MessageResponse;

/// GET /api/admin/stats
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<AdminStats>> {
    let stats = AdminService::new(state.pool()).stats().await?;
    Ok(Json(stats))
}

/// Registered and guest orders, newest first.
///
/// GET /api/admin/orders
pub async fn orders(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<AdminOrderView>>> {
    let orders = AdminService::new(state.pool()).all_orders().await?;
    Ok(Json(orders))
}

/// PATCH /api/admin/orders/{orderNumber}/status
#[instrument(skip(state, admin, body), fields(admin = %admin.id))]
pub async fn update_order_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    AppPath(order_number): AppPath<String>,
    AppJson(body): AppJson<StatusUpdate>,
) -> Result<Json<StatusChange>> {
    let change = AdminService::new(state.pool())
        .update_order_status(&order_number, &body.status)
        .await?;
    Ok(Json(change))
}

/// DELETE /api/admin/users/{userId}
#[instrument(skip(state, admin), fields(admin = %admin.id))]
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    AppPath(user_id): AppPath<UserId>,
) -> Result<Json<MessageResponse>> {
    AdminService::new(state.pool()).delete_user(user_id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
