//! Stripe webhook tests.

mod common;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use common::{test_config, wishlist_item, TestHarness};
use serde_json::{json, Value};

use comicshop_core::OrderId;
use comicshop_service::crypto::hmac_sha256_hex;
use comicshop_service::ServiceConfig;
use comicshop_store::Store;

const WEBHOOK_SECRET: &str = "whsec_test_secret";

fn signed_harness() -> TestHarness {
    TestHarness::with_config(ServiceConfig {
        stripe_api_key: Some("sk_test_123".into()),
        stripe_webhook_secret: Some(WEBHOOK_SECRET.into()),
        ..test_config()
    })
}

fn signature_header(payload: &str, timestamp: i64) -> HeaderValue {
    let signed = format!("{timestamp}.{payload}");
    let digest = hmac_sha256_hex(WEBHOOK_SECRET.as_bytes(), signed.as_bytes()).unwrap();
    HeaderValue::from_str(&format!("t={timestamp},v1={digest}")).unwrap()
}

fn succeeded_event(order_id: &str, user_id: &str) -> String {
    json!({
        "id": "evt_1",
        "type": "payment_intent.succeeded",
        "created": 1_700_000_000,
        "data": {
            "object": {
                "id": "pi_test_1",
                "amount": 999,
                "currency": "usd",
                "status": "succeeded",
                "metadata": { "order_id": order_id, "user_id": user_id }
            }
        }
    })
    .to_string()
}

/// Place an order and return `(order_id, user_id)`.
async fn placed_order(harness: &TestHarness) -> (String, String) {
    let buyer = harness.seed_profile("ada").await;
    let comic = harness.seed_comic("Watchmen #1", 999, 5).await;

    let body: Value = harness
        .server
        .post("/api/orders")
        .json(&json!({
            "userId": buyer.user_id.to_string(),
            "wishlistItems": [wishlist_item(&comic, "9.99", 1)]
        }))
        .await
        .json();
    (
        body["orderId"].as_str().unwrap().to_string(),
        buyer.user_id.to_string(),
    )
}

fn stripe_signature() -> HeaderName {
    HeaderName::from_static("stripe-signature")
}

#[tokio::test]
async fn test_signed_success_event_issues_receipt_once() {
    let harness = signed_harness();
    let (order_id, user_id) = placed_order(&harness).await;
    let payload = succeeded_event(&order_id, &user_id);
    let now = chrono::Utc::now().timestamp();

    for _ in 0..2 {
        let response = harness
            .server
            .post("/webhooks/stripe")
            .add_header(stripe_signature(), signature_header(&payload, now))
            .text(&payload)
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["received"], true);
    }

    assert_eq!(harness.store.receipt_count().await, 1);
    let order_id: OrderId = order_id.parse().unwrap();
    let receipt = harness.store.get_receipt_by_order(&order_id).await.unwrap();
    assert!(receipt.is_some());
}

#[tokio::test]
async fn test_webhook_rejects_bad_signatures() {
    let harness = signed_harness();
    let (order_id, user_id) = placed_order(&harness).await;
    let payload = succeeded_event(&order_id, &user_id);
    let now = chrono::Utc::now().timestamp();

    let missing = harness
        .server
        .post("/webhooks/stripe")
        .text(&payload)
        .await;
    missing.assert_status(StatusCode::BAD_REQUEST);

    let tampered = harness
        .server
        .post("/webhooks/stripe")
        .add_header(stripe_signature(), signature_header("{}", now))
        .text(&payload)
        .await;
    tampered.assert_status(StatusCode::BAD_REQUEST);

    let stale = harness
        .server
        .post("/webhooks/stripe")
        .add_header(stripe_signature(), signature_header(&payload, now - 3600))
        .text(&payload)
        .await;
    stale.assert_status(StatusCode::BAD_REQUEST);

    assert_eq!(harness.store.receipt_count().await, 0);
}

#[tokio::test]
async fn test_webhook_without_secret_skips_verification() {
    let harness = TestHarness::new();
    let (order_id, user_id) = placed_order(&harness).await;

    harness
        .server
        .post("/webhooks/stripe")
        .text(succeeded_event(&order_id, &user_id))
        .await
        .assert_status_ok();

    assert_eq!(harness.store.receipt_count().await, 1);
}

#[tokio::test]
async fn test_webhook_acknowledges_events_it_ignores() {
    let harness = TestHarness::new();

    let no_metadata = json!({
        "id": "evt_2",
        "type": "payment_intent.succeeded",
        "data": {
            "object": { "id": "pi_x", "amount": 100, "currency": "usd", "status": "succeeded" }
        }
    });
    harness
        .server
        .post("/webhooks/stripe")
        .text(no_metadata)
        .await
        .assert_status_ok();

    let failed = json!({
        "id": "evt_3",
        "type": "payment_intent.payment_failed",
        "data": { "object": { "id": "pi_x" } }
    });
    harness
        .server
        .post("/webhooks/stripe")
        .text(failed)
        .await
        .assert_status_ok();

    assert_eq!(harness.store.receipt_count().await, 0);
}

#[tokio::test]
async fn test_webhook_rejects_malformed_payload() {
    let harness = TestHarness::new();

    harness
        .server
        .post("/webhooks/stripe")
        .text("not json")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
