//! Account route handlers.
//!
//! Registration and login return the account together with a bearer token;
//! the SPA keeps the token and sends it on later requests.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use fitsphere_core::{Email, Role, UserId};

use crate::db::UserRepository;
use crate::error::Result;
use crate::extract::AppJson;
use crate::middleware::{RequireAdmin, RequireUser};
use crate::models::User;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Body of `POST /api/auth/register`.
///
/// Any `role` sent by the client is ignored.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Account plus a fresh token.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub role: Role,
    pub token: String,
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AuthError::MissingField(field).into())
}

fn respond(state: &AppState, user: User) -> Result<AuthResponse> {
    let token = state
        .tokens()
        .issue(user.id, user.role)
        .map_err(AuthError::from)?;

    Ok(AuthResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        role: user.role,
        token,
    })
}

/// Create a shopper account.
///
/// POST /api/auth/register
#[instrument(skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(body): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let username = required(body.username.as_deref(), "username")?;
    let email = required(body.email.as_deref(), "email")?;
    let password = required(body.password.as_deref(), "password")?;

    let user = AuthService::new(state.pool())
        .register(username, email, password)
        .await?;

    Ok((StatusCode::CREATED, Json(respond(&state, user)?)))
}

/// Log in with email and password.
///
/// POST /api/auth/login
#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(body): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let email = required(body.email.as_deref(), "email")?;
    let password = required(body.password.as_deref(), "password")?;

    let user = AuthService::new(state.pool())
        .login(email, password)
        .await
        .inspect_err(|e| {
            if matches!(e, AuthError::InvalidCredentials) {
                tracing::warn!("Failed login attempt");
            }
        })?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(respond(&state, user)?))
}

/// Current account.
///
/// GET /api/auth/profile
pub async fn profile(RequireUser(user): RequireUser) -> Json<User> {
    Json(user)
}

/// All accounts.
///
/// GET /api/auth/users
pub async fn users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<User>>> {
    let users = UserRepository::new(state.pool()).list().await?;
    Ok(Json(users))
}
