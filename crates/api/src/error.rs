//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error response has the body `{"message": "..."}`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use fitsphere_core::CartError;

use crate::db::RepositoryError;
use crate::models::ProductValidationError;
use crate::services::admin::AdminError;
use crate::services::auth::{AuthError, TokenError};
use crate::services::orders::OrderError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout or order update failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Back-office operation failed.
    #[error("Admin error: {0}")]
    Admin(#[from] AdminError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Product payload rejected.
    #[error("Validation error: {0}")]
    Validation(#[from] ProductValidationError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error is the server's fault.
    const fn is_server_error(&self) -> bool {
        match self {
            Self::Database(err) | Self::Order(OrderError::Repository(err)) => {
                !matches!(err, RepositoryError::NotFound | RepositoryError::Conflict(_))
            }
            Self::Auth(err) => matches!(
                err,
                AuthError::Repository(_)
                    | AuthError::PasswordHash
                    | AuthError::Token(TokenError::Encoding(_))
            ),
            Self::Admin(AdminError::Repository(_)) | Self::Internal(_) => true,
            _ => false,
        }
    }

    /// Status code and client-facing message.
    fn status_and_message(&self) -> (StatusCode, String) {
        // Don't expose internal error details to clients
        if self.is_server_error() {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            );
        }

        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
                RepositoryError::Conflict(what) => (StatusCode::BAD_REQUEST, capitalize(what)),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                ),
            },
            Self::Auth(err) => auth_status_and_message(err),
            Self::Order(err) => match err {
                OrderError::NotFound => (StatusCode::NOT_FOUND, "Order not found".to_string()),
                OrderError::Forbidden => (
                    StatusCode::FORBIDDEN,
                    "Not authorized to update this order".to_string(),
                ),
                _ => (StatusCode::BAD_REQUEST, capitalize(&err.to_string())),
            },
            Self::Admin(err) => match err {
                AdminError::UserNotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
                AdminError::OrderNotFound => {
                    (StatusCode::NOT_FOUND, "Order not found".to_string())
                }
                AdminError::CannotDeleteAdmin => {
                    (StatusCode::FORBIDDEN, "Cannot delete admin user".to_string())
                }
                _ => (StatusCode::BAD_REQUEST, capitalize(&err.to_string())),
            },
            Self::Cart(err) => match err {
                CartError::ItemNotFound(_) => (StatusCode::NOT_FOUND, capitalize(&err.to_string())),
                CartError::ZeroQuantity => {
                    (StatusCode::BAD_REQUEST, capitalize(&err.to_string()))
                }
            },
            Self::Validation(err) => (StatusCode::BAD_REQUEST, capitalize(&err.to_string())),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests, please try again later".to_string(),
            ),
            Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        }
    }
}

fn auth_status_and_message(err: &AuthError) -> (StatusCode, String) {
    match err {
        AuthError::InvalidCredentials | AuthError::UserNotFound => {
            (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
        }
        AuthError::UserAlreadyExists(what) => (StatusCode::BAD_REQUEST, capitalize(what)),
        AuthError::WeakPassword(msg) | AuthError::InvalidUsername(msg) => {
            (StatusCode::BAD_REQUEST, capitalize(msg))
        }
        AuthError::InvalidEmail(_) => {
            (StatusCode::BAD_REQUEST, "Invalid email address".to_string())
        }
        AuthError::MissingField(_) => (StatusCode::BAD_REQUEST, capitalize(&err.to_string())),
        AuthError::Token(TokenError::Expired) => {
            (StatusCode::UNAUTHORIZED, "Token expired".to_string())
        }
        AuthError::Token(TokenError::Invalid) => {
            (StatusCode::UNAUTHORIZED, "Invalid token".to_string())
        }
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
    }
}

/// Upper-case the first letter of a message.
fn capitalize(msg: &str) -> String {
    let mut chars = msg.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let (status, message) = self.status_and_message();
        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fitsphere_core::ProductId;

    use super::*;

    fn status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn message(err: AppError) -> String {
        let body = axum::body::to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        json["message"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(status(AppError::NotFound("test".to_string())), StatusCode::NOT_FOUND);
        assert_eq!(
            status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status(AppError::Forbidden("test".to_string())), StatusCode::FORBIDDEN);
        assert_eq!(
            status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(AppError::RateLimited), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_domain_error_status_codes() {
        assert_eq!(
            status(AuthError::UserAlreadyExists("email already exists".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(AuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status(OrderError::EmptyOrder.into()), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(OrderError::UnknownProduct(ProductId::new(3)).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(OrderError::TotalTooLarge.into()), StatusCode::BAD_REQUEST);
        assert_eq!(status(OrderError::Forbidden.into()), StatusCode::FORBIDDEN);
        assert_eq!(status(OrderError::NotFound.into()), StatusCode::NOT_FOUND);
        assert_eq!(
            status(AdminError::CannotDeleteAdmin.into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status(RepositoryError::NotFound.into()), StatusCode::NOT_FOUND);
        assert_eq!(
            status(RepositoryError::DataCorruption("bad row".to_string()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_messages_are_json() {
        assert_eq!(
            message(AppError::NotFound("Route not found".to_string())).await,
            "Route not found"
        );
        assert_eq!(
            message(AuthError::UserAlreadyExists("email already exists".to_string()).into())
                .await,
            "Email already exists"
        );
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let err = AppError::Internal("connection string postgres://secret".to_string());
        assert_eq!(message(err).await, "Internal server error");
    }
}
