//! Checkout tests: `POST /api/orders` and the `place_order` workflow.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use common::{wishlist_item, RecordingGateway, TestHarness};
use serde_json::{json, Value};

use comicshop_core::{OrderId, ShopError, UserId, WishlistItem};
use comicshop_service::{place_order, place_order_detached};
use comicshop_store::{MemoryStore, Store};

#[tokio::test]
async fn test_checkout_charges_server_computed_total() {
    let harness = TestHarness::new();
    let buyer = harness.seed_profile("ada").await;
    let comic = harness.seed_comic("Watchmen #1", 999, 5).await;

    let response = harness
        .server
        .post("/api/orders")
        .json(&json!({
            "amount": 1,
            "userId": buyer.user_id.to_string(),
            "wishlistItems": [wishlist_item(&comic, "9.99", 2)]
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["clientSecret"], "pi_test_1_secret");
    let order_id: OrderId = body["orderId"].as_str().unwrap().parse().unwrap();

    let order = harness.store.get_order(&order_id).await.unwrap().unwrap();
    assert_eq!(order.total_amount, 1998);
    assert_eq!(order.currency, "usd");
    assert_eq!(order.user_id, buyer.user_id);
    assert_eq!(order.user_name, "ada");
    assert_eq!(order.payment_intent_id.as_deref(), Some("pi_test_1"));
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].price, 999);
    assert_eq!(order.items[0].quantity, 2);
    assert_eq!(order.items[0].comic_id, comic.id);

    let created = harness.gateway.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].amount, 1998);
    assert_eq!(created[0].currency, "usd");
    assert_eq!(created[0].order_id, order_id);
    assert_eq!(created[0].user_id, buyer.user_id);

    assert_eq!(harness.stock_of(&comic).await, 3);
    assert!(harness.gateway.cancelled().is_empty());
}

#[tokio::test]
async fn test_checkout_merges_repeated_comics() {
    let harness = TestHarness::new();
    let buyer = harness.seed_profile("ada").await;
    let comic = harness.seed_comic("Saga #1", 350, 5).await;

    let response = harness
        .server
        .post("/api/orders")
        .json(&json!({
            "userId": buyer.user_id.to_string(),
            "wishlistItems": [
                wishlist_item(&comic, "3.50", 2),
                wishlist_item(&comic, "3.50", 3)
            ]
        }))
        .await;
    response.assert_status_ok();

    assert_eq!(harness.stock_of(&comic).await, 0);
    assert_eq!(harness.gateway.created()[0].amount, 1750);
}

#[tokio::test]
async fn test_checkout_rejects_empty_wishlist_before_gateway() {
    let harness = TestHarness::new();
    let buyer = harness.seed_profile("ada").await;

    let response = harness
        .server
        .post("/api/orders")
        .json(&json!({
            "userId": buyer.user_id.to_string(),
            "wishlistItems": []
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["code"], "bad_request");
    assert!(harness.gateway.created().is_empty());
    assert_eq!(harness.store.order_count().await, 0);
}

#[tokio::test]
async fn test_checkout_requires_user_id() {
    let harness = TestHarness::new();
    let comic = harness.seed_comic("Hellboy #1", 499, 5).await;

    let response = harness
        .server
        .post("/api/orders")
        .json(&json!({ "wishlistItems": [wishlist_item(&comic, "4.99", 1)] }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["error"], "userId is required");
}

#[tokio::test]
async fn test_checkout_rounds_sub_cent_prices_on_the_total() {
    let harness = TestHarness::new();
    let buyer = harness.seed_profile("ada").await;
    let comic = harness.seed_comic("Hellboy #1", 33, 5).await;

    let response = harness
        .server
        .post("/api/orders")
        .json(&json!({
            "userId": buyer.user_id.to_string(),
            "wishlistItems": [wishlist_item(&comic, "0.333", 3)]
        }))
        .await;
    response.assert_status_ok();

    let created = harness.gateway.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].amount, 100);
    assert_eq!(harness.stock_of(&comic).await, 2);
}

#[tokio::test]
async fn test_checkout_unknown_buyer_opens_no_intent() {
    let harness = TestHarness::new();
    let comic = harness.seed_comic("Sandman #1", 299, 5).await;

    let response = harness
        .server
        .post("/api/orders")
        .json(&json!({
            "userId": UserId::generate().to_string(),
            "wishlistItems": [wishlist_item(&comic, "2.99", 1)]
        }))
        .await;
    response.assert_status_not_found();

    let body: Value = response.json();
    assert_eq!(body["code"], "not_found");
    assert!(harness.gateway.created().is_empty());
    assert_eq!(harness.stock_of(&comic).await, 5);
}

#[tokio::test]
async fn test_checkout_out_of_stock_cancels_intent() {
    let harness = TestHarness::new();
    let buyer = harness.seed_profile("ada").await;
    let comic = harness.seed_comic("Maus", 1500, 1).await;

    let response = harness
        .server
        .post("/api/orders")
        .json(&json!({
            "userId": buyer.user_id.to_string(),
            "wishlistItems": [wishlist_item(&comic, "15.00", 2)]
        }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let body: Value = response.json();
    assert_eq!(body["code"], "out_of_stock");

    assert_eq!(harness.gateway.cancelled(), vec!["pi_test_1".to_string()]);
    assert_eq!(harness.stock_of(&comic).await, 1);
    assert_eq!(harness.store.order_count().await, 0);
}

#[tokio::test]
async fn test_checkout_is_all_or_nothing_across_comics() {
    let harness = TestHarness::new();
    let buyer = harness.seed_profile("ada").await;
    let plenty = harness.seed_comic("Bone #1", 200, 5).await;
    let scarce = harness.seed_comic("Bone #2", 200, 1).await;

    let response = harness
        .server
        .post("/api/orders")
        .json(&json!({
            "userId": buyer.user_id.to_string(),
            "wishlistItems": [
                wishlist_item(&plenty, "2.00", 2),
                wishlist_item(&scarce, "2.00", 2)
            ]
        }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    assert_eq!(harness.stock_of(&plenty).await, 5);
    assert_eq!(harness.stock_of(&scarce).await, 1);
    assert_eq!(harness.store.order_count().await, 0);
}

#[tokio::test]
async fn test_checkout_gateway_failure_stores_nothing() {
    let harness = TestHarness::new();
    harness.gateway.fail_creates();
    let buyer = harness.seed_profile("ada").await;
    let comic = harness.seed_comic("Akira #1", 1200, 3).await;

    let response = harness
        .server
        .post("/api/orders")
        .json(&json!({
            "userId": buyer.user_id.to_string(),
            "wishlistItems": [wishlist_item(&comic, "12.00", 1)]
        }))
        .await;
    response.assert_status(StatusCode::BAD_GATEWAY);

    let body: Value = response.json();
    assert_eq!(body["code"], "gateway_error");
    assert_eq!(harness.stock_of(&comic).await, 3);
    assert_eq!(harness.store.order_count().await, 0);
}

#[tokio::test]
async fn test_order_history_is_newest_first_and_paged() {
    let harness = TestHarness::new();
    let buyer = harness.seed_profile("ada").await;
    let comic = harness.seed_comic("Y: The Last Man #1", 399, 10).await;

    let mut placed = Vec::new();
    for _ in 0..2 {
        let response = harness
            .server
            .post("/api/orders")
            .json(&json!({
                "userId": buyer.user_id.to_string(),
                "wishlistItems": [wishlist_item(&comic, "3.99", 1)]
            }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        placed.push(body["orderId"].as_str().unwrap().to_string());
    }

    let response = harness
        .server
        .get("/api/orders")
        .add_query_param("userId", buyer.user_id.to_string())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["id"], placed[1]);
    assert_eq!(orders[1]["id"], placed[0]);
    assert_eq!(body["hasMore"], false);

    let response = harness
        .server
        .get("/api/orders")
        .add_query_param("userId", buyer.user_id.to_string())
        .add_query_param("limit", 1)
        .await;
    let body: Value = response.json();
    assert_eq!(body["orders"].as_array().unwrap().len(), 1);
    assert_eq!(body["hasMore"], true);
}

#[tokio::test]
async fn test_order_history_requires_valid_user_id() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/api/orders")
        .add_query_param("userId", "not-a-uuid")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_concurrent_checkouts_never_oversell() {
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(RecordingGateway::new());

    let seller = UserId::generate();
    let comic = comicshop_core::Comic::new(seller, "Last copy", 2500, "usd", 1);
    store.put_comic(&comic).await.unwrap();

    let mut buyers = Vec::new();
    for name in ["ada", "grace"] {
        let profile = comicshop_core::Profile::new(UserId::generate(), name);
        store.put_profile(&profile).await.unwrap();
        buyers.push(profile.user_id);
    }

    let wishlist: Vec<WishlistItem> =
        vec![serde_json::from_value(wishlist_item(&comic, "25.00", 1)).unwrap()];

    let handles: Vec<_> = buyers
        .into_iter()
        .map(|buyer| {
            let store = store.clone();
            let gateway = gateway.clone();
            let wishlist = wishlist.clone();
            tokio::spawn(async move {
                place_order(store.as_ref(), gateway.as_ref(), buyer, &wishlist).await
            })
        })
        .collect();

    let mut placed = 0;
    let mut out_of_stock = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => placed += 1,
            Err(ShopError::OutOfStock { .. }) => out_of_stock += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(placed, 1);
    assert_eq!(out_of_stock, 1);
    assert_eq!(store.get_comic(&comic.id).await.unwrap().unwrap().stock, 0);
    assert_eq!(gateway.cancelled().len(), 1);
}

#[tokio::test]
async fn test_abandoned_checkout_still_cancels_intent() {
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(RecordingGateway::new());
    gateway.delay_cancels(Duration::from_millis(100));

    let comic = comicshop_core::Comic::new(UserId::generate(), "Maus", 1500, "usd", 1);
    store.put_comic(&comic).await.unwrap();
    let buyer = comicshop_core::Profile::new(UserId::generate(), "ada");
    store.put_profile(&buyer).await.unwrap();

    let wishlist: Vec<WishlistItem> =
        vec![serde_json::from_value(wishlist_item(&comic, "15.00", 2)).unwrap()];

    let abandoned = tokio::time::timeout(
        Duration::from_millis(20),
        place_order_detached(store.clone(), gateway.clone(), buyer.user_id, wishlist),
    )
    .await;
    assert!(abandoned.is_err());
    assert_eq!(gateway.created().len(), 1);
    assert!(gateway.cancelled().is_empty());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(gateway.cancelled(), vec!["pi_test_1".to_string()]);
    assert_eq!(store.get_comic(&comic.id).await.unwrap().unwrap().stock, 1);
    assert_eq!(store.order_count().await, 0);
}
