//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. CORS
//! 3. `TraceLayer` (request tracing)
//! 4. Request ID (add unique ID to each request)
//! 5. Security headers
//! 6. Session layer (cart routes only)
//! 7. Rate limiting (login and registration only)
//!
//! Authentication is not a layer: handlers take the [`RequireUser`] or
//! [`RequireAdmin`] extractor.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{RequireAdmin, RequireUser};
pub use rate_limit::{auth_rate_limiter, json_rate_limit_errors};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
