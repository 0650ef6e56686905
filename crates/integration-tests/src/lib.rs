//! Integration tests for the FitSphere API.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate, create an admin and start the server
//! cargo run -p fitsphere-cli -- migrate
//! cargo run -p fitsphere-cli -- user create -u admin -e admin@fitsphere.test -p 'admin-password' -r admin
//! cargo run -p fitsphere-api
//!
//! # Run the ignored tests against it
//! FITSPHERE_TEST_ADMIN_EMAIL=admin@fitsphere.test \
//! FITSPHERE_TEST_ADMIN_PASSWORD=admin-password \
//!     cargo test -p fitsphere-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `FITSPHERE_API_URL` - Server under test (default: <http://localhost:5000>)
//! - `FITSPHERE_TEST_ADMIN_EMAIL` / `FITSPHERE_TEST_ADMIN_PASSWORD` - An admin account
//!
//! Every test creates its own accounts and products with unique names, so
//! the suite can run repeatedly against the same database.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc)]

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde_json::{Value, json};

/// Attempts made against the rate-limited auth endpoints.
const AUTH_ATTEMPTS: u32 = 5;

/// Base URL of the API under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("FITSPHERE_API_URL").unwrap_or_else(|_| "http://localhost:5000".to_string())
}

/// Full URL for an API path such as `/api/products`.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", base_url().trim_end_matches('/'))
}

/// HTTP client with a cookie jar, so cart sessions survive between calls.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Short random suffix for unique usernames, emails and product names.
#[must_use]
pub fn unique(prefix: &str) -> String {
    let id: String = uuid::Uuid::new_v4().simple().to_string().chars().take(10).collect();
    format!("{prefix}{id}")
}

/// A logged-in account.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub token: String,
}

/// Register a fresh shopper account.
pub async fn register(client: &Client) -> Account {
    let name = unique("shopper");
    let email = format!("{name}@fitsphere.test");

    let body = json!({ "username": name, "email": email, "password": "secret-pass" });
    let resp = post_auth(client, "/api/auth/register", &body).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    account(resp.json().await.expect("Invalid register response"), email)
}

/// Log in with the admin account named by the environment.
pub async fn admin(client: &Client) -> Account {
    let email = std::env::var("FITSPHERE_TEST_ADMIN_EMAIL")
        .expect("FITSPHERE_TEST_ADMIN_EMAIL must be set");
    let password = std::env::var("FITSPHERE_TEST_ADMIN_PASSWORD")
        .expect("FITSPHERE_TEST_ADMIN_PASSWORD must be set");

    let body = json!({ "email": email, "password": password });
    let resp = post_auth(client, "/api/auth/login", &body).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("Invalid login response");
    assert_eq!(body["role"], "admin");
    account(body, email)
}

/// POST to a rate-limited auth endpoint, waiting out 429 responses.
pub async fn post_auth(client: &Client, path: &str, body: &Value) -> Response {
    for _ in 1..AUTH_ATTEMPTS {
        let resp = client
            .post(url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to reach auth endpoint");
        if resp.status() != StatusCode::TOO_MANY_REQUESTS {
            return resp;
        }
        tokio::time::sleep(retry_after(&resp)).await;
    }

    client
        .post(url(path))
        .json(body)
        .send()
        .await
        .expect("Failed to reach auth endpoint")
}

fn retry_after(resp: &Response) -> Duration {
    let secs = resp
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(6);
    Duration::from_secs(secs)
}

fn account(body: Value, email: String) -> Account {
    Account {
        id: body["id"].as_i64().expect("missing id"),
        email,
        token: body["token"].as_str().expect("missing token").to_string(),
    }
}

/// Create a product as admin and return its JSON.
pub async fn create_product(client: &Client, admin: &Account, price: &str, stock: i32) -> Value {
    let resp = client
        .post(url("/api/products"))
        .bearer_auth(&admin.token)
        .json(&json!({
            "name": unique("Produit test "),
            "description": "Créé par les tests d'intégration",
            "price": price,
            "stock": stock,
            "category": "Fitness",
            "image": "https://images.fitsphere.example/test.jpg"
        }))
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.expect("Invalid product response")
}

/// A complete shipping address.
#[must_use]
pub fn address() -> Value {
    json!({
        "street": "12 rue de la République",
        "city": "Lyon",
        "postalCode": "69001",
        "country": "France"
    })
}
