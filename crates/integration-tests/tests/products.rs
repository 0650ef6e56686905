//! Integration tests for the product catalog.
//!
//! Requires a running API server, database and admin account; see the crate docs.

use fitsphere_integration_tests::{admin, client, create_product, register, url};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_product_lifecycle() {
    let client = client();
    let admin = admin(&client).await;

    let product = create_product(&client, &admin, "24.50", 10).await;
    let id = product["id"].as_i64().expect("missing product id");
    assert_eq!(product["trendy"], false);

    // Public detail
    let resp = client
        .get(url(&format!("/api/products/{id}")))
        .send()
        .await
        .expect("Failed to get product");
    assert_eq!(resp.status(), StatusCode::OK);

    // Partial update keeps the other fields
    let resp = client
        .put(url(&format!("/api/products/{id}")))
        .bearer_auth(&admin.token)
        .json(&json!({ "stock": 3 }))
        .send()
        .await
        .expect("Failed to update product");
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.expect("Invalid product body");
    assert_eq!(updated["stock"], 3);
    assert_eq!(updated["name"], product["name"]);

    // Trendy toggle shows up in the trendy filter
    let resp = client
        .patch(url(&format!("/api/products/{id}/trendy")))
        .bearer_auth(&admin.token)
        .json(&json!({ "trendy": true }))
        .send()
        .await
        .expect("Failed to set trendy");
    assert_eq!(resp.status(), StatusCode::OK);

    let trendy: Vec<Value> = client
        .get(url("/api/products?trendy=true"))
        .send()
        .await
        .expect("Failed to list trendy products")
        .json()
        .await
        .expect("Invalid product list");
    assert!(trendy.iter().any(|p| p["id"].as_i64() == Some(id)));

    // Delete, then 404
    let resp = client
        .delete(url(&format!("/api/products/{id}")))
        .bearer_auth(&admin.token)
        .send()
        .await
        .expect("Failed to delete product");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(url(&format!("/api/products/{id}")))
        .send()
        .await
        .expect("Failed to get product");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_category_filter() {
    let client = client();

    let products: Vec<Value> = client
        .get(url("/api/products?category=Yoga"))
        .send()
        .await
        .expect("Failed to list products")
        .json()
        .await
        .expect("Invalid product list");
    assert!(products.iter().all(|p| p["category"] == "Yoga"));

    let resp = client
        .get(url("/api/products?category=Tennis"))
        .send()
        .await
        .expect("Failed to list products");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_shopper_cannot_create_product() {
    let client = client();
    let shopper = register(&client).await;

    let resp = client
        .post(url("/api/products"))
        .bearer_auth(&shopper.token)
        .json(&json!({
            "name": "Interdit",
            "price": "1.00",
            "category": "Cardio",
            "image": "x.jpg"
        }))
        .send()
        .await
        .expect("Failed to post product");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
