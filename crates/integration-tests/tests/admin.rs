//! Integration tests for the admin back office.
//!
//! Requires a running API server, database and admin account; see the crate docs.

use fitsphere_integration_tests::{address, admin, client, create_product, register, url};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_stats_shape() {
    let client = client();
    let admin = admin(&client).await;

    let resp = client
        .get(url("/api/admin/stats"))
        .bearer_auth(&admin.token)
        .send()
        .await
        .expect("Failed to get stats");
    assert_eq!(resp.status(), StatusCode::OK);

    let stats: Value = resp.json().await.expect("Invalid stats body");
    assert!(stats["totalUsers"].as_i64().is_some_and(|n| n >= 1));
    assert!(stats["totalProducts"].is_i64());
    assert!(stats["totalOrders"].is_i64());
    assert!(
        stats["recentOrders"]
            .as_array()
            .is_some_and(|orders| orders.len() <= 5)
    );
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_update_guest_order_by_number() {
    let client = client();
    let admin = admin(&client).await;
    let product = create_product(&client, &admin, "7.00", 4).await;

    let checkout: Value = client
        .post(url("/api/guest-orders/checkout"))
        .json(&json!({
            "guestInfo": { "name": "Invité", "email": "guest@fitsphere.test" },
            "products": [{ "product": product["id"], "quantity": 1 }],
            "shippingAddress": address(),
            "payment": { "method": "card" }
        }))
        .send()
        .await
        .expect("Failed to check out")
        .json()
        .await
        .expect("Invalid checkout body");
    let number = checkout["orderNumber"].as_str().expect("order number");

    let resp = client
        .patch(url(&format!("/api/admin/orders/{number}/status")))
        .bearer_auth(&admin.token)
        .json(&json!({ "status": "shipped" }))
        .send()
        .await
        .expect("Failed to update status");
    assert_eq!(resp.status(), StatusCode::OK);

    let change: Value = resp.json().await.expect("Invalid status change body");
    assert_eq!(change["isGuestOrder"], true);
    assert_eq!(change["order"]["status"], "shipped");
    assert_eq!(change["order"]["customerInfo"]["type"], "guest");

    // Both kinds appear in the combined list
    let orders: Vec<Value> = client
        .get(url("/api/admin/orders"))
        .bearer_auth(&admin.token)
        .send()
        .await
        .expect("Failed to list orders")
        .json()
        .await
        .expect("Invalid order list");
    assert!(orders.iter().any(|o| o["orderNumber"] == number));
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_unknown_order_number() {
    let client = client();
    let admin = admin(&client).await;

    let resp = client
        .patch(url("/api/admin/orders/not-a-number/status"))
        .bearer_auth(&admin.token)
        .json(&json!({ "status": "shipped" }))
        .send()
        .await
        .expect("Failed to update status");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_delete_user() {
    let client = client();
    let admin = admin(&client).await;
    let shopper = register(&client).await;

    let resp = client
        .delete(url(&format!("/api/admin/users/{}", shopper.id)))
        .bearer_auth(&admin.token)
        .send()
        .await
        .expect("Failed to delete user");
    assert_eq!(resp.status(), StatusCode::OK);

    // The token now points at a missing account
    let resp = client
        .get(url("/api/auth/profile"))
        .bearer_auth(&shopper.token)
        .send()
        .await
        .expect("Failed to get profile");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Admins cannot be deleted
    let resp = client
        .delete(url(&format!("/api/admin/users/{}", admin.id)))
        .bearer_auth(&admin.token)
        .send()
        .await
        .expect("Failed to delete user");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
