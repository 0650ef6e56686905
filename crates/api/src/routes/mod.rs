//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                              - Liveness
//! GET    /health/ready                        - Readiness (database)
//!
//! # Auth
//! POST   /api/auth/register                   - Create account (rate limited)
//! POST   /api/auth/login                      - Log in (rate limited)
//! GET    /api/auth/profile                    - Current account (user)
//! GET    /api/auth/users                      - All accounts (admin)
//!
//! # Products
//! GET    /api/products                        - List (?category=, ?trendy=)
//! GET    /api/products/{id}                   - Detail
//! POST   /api/products                        - Create (admin)
//! PUT    /api/products/{id}                   - Partial update (admin)
//! DELETE /api/products/{id}                   - Delete (admin)
//! PATCH  /api/products/{id}/trendy            - Toggle trendy (admin)
//!
//! # Orders (user)
//! GET    /api/orders/user/{userId}            - A user's orders (`me` allowed)
//! POST   /api/orders                          - Checkout
//! PATCH  /api/orders/{orderId}/status         - Cancel (owner) or set (admin)
//!
//! # Guest orders
//! POST   /api/guest-orders/checkout           - Guest checkout
//! GET    /api/guest-orders/{id}               - Detail
//! GET    /api/guest-orders                    - List (admin)
//! PATCH  /api/guest-orders/{id}/status        - Set status (admin)
//!
//! # Admin
//! GET    /api/admin/stats                     - Dashboard counters
//! GET    /api/admin/orders                    - All orders of both kinds
//! PATCH  /api/admin/orders/{orderNumber}/status - Set status by order number
//! DELETE /api/admin/users/{userId}            - Delete a shopper account
//!
//! # Cart (session)
//! GET    /api/cart                            - Current cart
//! DELETE /api/cart                            - Empty the cart
//! POST   /api/cart/items                      - Add a product
//! PATCH  /api/cart/items/{productId}          - Set quantity
//! DELETE /api/cart/items/{productId}          - Remove a product
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod guest_orders;
pub mod health;
pub mod orders;
pub mod products;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware::from_fn,
    routing::{delete, get, patch, post},
};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::config::ApiConfig;
use crate::error::AppError;
use crate::middleware::{
    auth_rate_limiter, create_session_layer, json_rate_limit_errors, request_id_middleware,
    security_headers_middleware,
};
use crate::state::AppState;

/// Plain confirmation body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(auth_rate_limiter())
        .layer(from_fn(json_rate_limit_errors));

    Router::new()
        .route("/profile", get(auth::profile))
        .route("/users", get(auth::users))
        .merge(limited)
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/{id}/trendy", patch(products::set_trendy))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::create))
        .route("/user/{user_id}", get(orders::for_user))
        .route("/{order_id}/status", patch(orders::update_status))
}

/// Create the guest order routes router.
pub fn guest_order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(guest_orders::index))
        .route("/checkout", post(guest_orders::checkout))
        .route("/{id}", get(guest_orders::show))
        .route("/{id}/status", patch(guest_orders::update_status))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(admin::stats))
        .route("/orders", get(admin::orders))
        .route(
            "/orders/{order_number}/status",
            patch(admin::update_order_status),
        )
        .route("/users/{user_id}", delete(admin::delete_user))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route(
            "/items/{product_id}",
            patch(cart::update).delete(cart::remove),
        )
}

/// Create all `/api` routes.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    let session_layer = create_session_layer(state.pool(), state.config());

    Router::new()
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .nest("/orders", order_routes())
        .nest("/guest-orders", guest_order_routes())
        .nest("/admin", admin_routes())
        .nest("/cart", cart_routes().layer(session_layer))
}

/// Build the complete application: routes, fallback and middleware stack.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(state.config());

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes(&state))
        .fallback(not_found)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .layer(cors)
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// CORS for the SPA origins, with credentials for the cart cookie.
fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use chrono::Duration;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use fitsphere_core::{Role, UserId};

    use super::*;
    use crate::config::Environment;
    use crate::services::auth::TokenService;

    const JWT_SECRET: &str = "kX9#mQ2$vL7@pR4!wT8&zN3*bF6^hJ1%";

    fn config() -> ApiConfig {
        ApiConfig {
            database_url: SecretString::from("postgres://fitsphere@localhost:1/fitsphere"),
            host: "127.0.0.1".parse().unwrap(),
            port: 5000,
            environment: Environment::Development,
            base_url: "http://localhost:5000".to_string(),
            frontend_url: None,
            jwt_secret: SecretString::from(JWT_SECRET),
            jwt_ttl: Duration::days(30),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Router over a pool that never connects; only routes that fail
    /// before touching the database are exercised.
    fn test_app() -> Router {
        let pool = PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(200))
            .connect_lazy("postgres://fitsphere@localhost:1/fitsphere")
            .unwrap();
        app(AppState::new(config(), pool))
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = test_app().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(
            response.headers()["x-content-type-options"],
            HeaderValue::from_static("nosniff")
        );
    }

    #[tokio::test]
    async fn test_readiness_without_database() {
        let response = test_app().oneshot(get("/health/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (status, body) = send(get("/api/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Route not found");
    }

    #[tokio::test]
    async fn test_missing_token() {
        let (status, body) = send(get("/api/auth/profile")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Not authorized - no token provided");
    }

    #[tokio::test]
    async fn test_malformed_authorization_header() {
        let request = Request::builder()
            .uri("/api/admin/stats")
            .header("authorization", "Token abc")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            body["message"],
            "Not authorized - invalid authorization header format"
        );
    }

    #[tokio::test]
    async fn test_invalid_and_expired_tokens() {
        let request = Request::builder()
            .uri("/api/auth/users")
            .header("authorization", "Bearer not.a.jwt")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Not authorized - invalid token");

        let tokens = TokenService::new(&SecretString::from(JWT_SECRET), Duration::days(30));
        let stale = tokens
            .issue_at(
                UserId::new(1),
                Role::Admin,
                chrono::Utc::now() - Duration::days(40),
            )
            .unwrap();
        let request = Request::builder()
            .uri("/api/auth/users")
            .header("authorization", format!("Bearer {stale}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Not authorized - token expired");
    }

    #[tokio::test]
    async fn test_bad_json_body_is_json_error() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/guest-orders/checkout")
            .header("content-type", "application/json")
            .header("x-forwarded-for", "203.0.113.5")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_login_requires_fields() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header("content-type", "application/json")
            .header("x-forwarded-for", "203.0.113.6")
            .body(Body::from(r#"{"email":"someone@example.com"}"#))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Password is required");
    }

    #[tokio::test]
    async fn test_login_rate_limit_is_json() {
        let app = test_app();
        let mut last = None;
        for _ in 0..6 {
            let request = Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("content-type", "application/json")
                .header("x-forwarded-for", "203.0.113.77")
                .body(Body::from("{}"))
                .unwrap();
            last = Some(app.clone().oneshot(request).await.unwrap());
        }

        let response = last.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Too many requests, please try again later");
    }

    #[tokio::test]
    async fn test_cors_preflight_for_dev_origin() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/products")
            .header("origin", "http://localhost:5173")
            .header("access-control-request-method", "GET")
            .body(Body::empty())
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            HeaderValue::from_static("http://localhost:5173")
        );
        assert_eq!(
            response.headers()["access-control-allow-credentials"],
            HeaderValue::from_static("true")
        );
    }
}
