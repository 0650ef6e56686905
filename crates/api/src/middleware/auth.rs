//! Bearer-token authentication extractors.
//!
//! Handlers take [`RequireUser`] or [`RequireAdmin`] to guard a route. The
//! token's user is reloaded from the database on every request, so deleted
//! accounts and role changes take effect immediately.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::db::UserRepository;
use crate::error::{AppError, set_sentry_user};
use crate::models::User;
use crate::services::auth::TokenError;
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(RequireUser(user): RequireUser) -> Json<User> {
///     Json(user)
/// }
/// ```
pub struct RequireUser(pub User);

/// Extractor that requires a valid bearer token belonging to an admin.
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| unauthorized("no token provided"))?;

        let token = header
            .to_str()
            .ok()
            .and_then(bearer_token)
            .ok_or_else(|| unauthorized("invalid authorization header format"))?;

        let claims = state.tokens().verify(token).map_err(|e| match e {
            TokenError::Expired => unauthorized("token expired"),
            _ => unauthorized("invalid token"),
        })?;
        let user_id = claims
            .user_id()
            .map_err(|_| unauthorized("invalid token"))?;

        let user = UserRepository::new(state.pool())
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| unauthorized("user not found"))?;

        set_sentry_user(&user.id, Some(user.email.as_str()));
        tracing::Span::current().record("user_id", user.id.as_i32());

        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "Admin route refused");
            return Err(AppError::Forbidden(
                "Access denied - admin rights required".to_string(),
            ));
        }

        Ok(Self(user))
    }
}

/// Token from an `Authorization: Bearer <token>` value.
fn bearer_token(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn unauthorized(reason: &str) -> AppError {
    AppError::Unauthorized(format!("Not authorized - {reason}"))
}
