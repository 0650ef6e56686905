//! Integration tests for the session cart.
//!
//! Requires a running API server, database and admin account; see the crate docs.

use fitsphere_integration_tests::{admin, client, create_product, url};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_cart_follows_session_cookie() {
    let client = client();
    let admin = admin(&client).await;
    let product = create_product(&client, &admin, "9.99", 30).await;
    let id = product["id"].as_i64().expect("missing product id");

    let cart: Value = client
        .get(url("/api/cart"))
        .send()
        .await
        .expect("Failed to get cart")
        .json()
        .await
        .expect("Invalid cart body");
    assert_eq!(cart["count"], 0);

    // Adding twice merges into one line
    for _ in 0..2 {
        let resp = client
            .post(url("/api/cart/items"))
            .json(&json!({ "product": id }))
            .send()
            .await
            .expect("Failed to add to cart");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let cart: Value = client
        .get(url("/api/cart"))
        .send()
        .await
        .expect("Failed to get cart")
        .json()
        .await
        .expect("Invalid cart body");
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(cart["count"], 2);

    // Quantity below one is ignored
    let cart: Value = client
        .patch(url(&format!("/api/cart/items/{id}")))
        .json(&json!({ "quantity": 0 }))
        .send()
        .await
        .expect("Failed to update cart")
        .json()
        .await
        .expect("Invalid cart body");
    assert_eq!(cart["count"], 2);

    let cart: Value = client
        .patch(url(&format!("/api/cart/items/{id}")))
        .json(&json!({ "quantity": 5 }))
        .send()
        .await
        .expect("Failed to update cart")
        .json()
        .await
        .expect("Invalid cart body");
    assert_eq!(cart["count"], 5);

    // A different client has its own empty cart
    let other: Value = fitsphere_integration_tests::client()
        .get(url("/api/cart"))
        .send()
        .await
        .expect("Failed to get cart")
        .json()
        .await
        .expect("Invalid cart body");
    assert_eq!(other["count"], 0);

    let cart: Value = client
        .delete(url(&format!("/api/cart/items/{id}")))
        .send()
        .await
        .expect("Failed to remove item")
        .json()
        .await
        .expect("Invalid cart body");
    assert_eq!(cart["count"], 0);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_add_unknown_product() {
    let client = client();

    let resp = client
        .post(url("/api/cart/items"))
        .json(&json!({ "product": 2_000_000_000, "quantity": 1 }))
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
