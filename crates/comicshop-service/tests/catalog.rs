//! Stock, catalogue and cart tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::{json, Value};

use comicshop_core::{ComicId, UserId};

#[tokio::test]
async fn test_update_stock_overwrites_total() {
    let harness = TestHarness::new();
    let comic = harness.seed_comic("Bone #1", 200, 3).await;

    let response = harness
        .server
        .post("/api/stock")
        .json(&json!({ "comicId": comic.id.to_string(), "newStock": 12 }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], comic.id.to_string());
    assert_eq!(rows[0]["stock"], 12);
    assert_eq!(harness.stock_of(&comic).await, 12);
}

#[tokio::test]
async fn test_update_stock_accepts_zero() {
    let harness = TestHarness::new();
    let comic = harness.seed_comic("Bone #1", 200, 3).await;

    harness
        .server
        .post("/api/stock")
        .json(&json!({ "comicId": comic.id.to_string(), "newStock": 0 }))
        .await
        .assert_status_ok();
    assert_eq!(harness.stock_of(&comic).await, 0);
}

#[tokio::test]
async fn test_update_stock_validates_input() {
    let harness = TestHarness::new();
    let comic = harness.seed_comic("Bone #1", 200, 3).await;

    let missing_stock = harness
        .server
        .post("/api/stock")
        .json(&json!({ "comicId": comic.id.to_string() }))
        .await;
    missing_stock.assert_status(StatusCode::BAD_REQUEST);

    let negative = harness
        .server
        .post("/api/stock")
        .json(&json!({ "comicId": comic.id.to_string(), "newStock": -1 }))
        .await;
    negative.assert_status(StatusCode::BAD_REQUEST);

    let missing_comic = harness
        .server
        .post("/api/stock")
        .json(&json!({ "newStock": 4 }))
        .await;
    missing_comic.assert_status(StatusCode::BAD_REQUEST);

    let malformed = harness
        .server
        .post("/api/stock")
        .json(&json!({ "comicId": comic.id.to_string(), "newStock": "lots" }))
        .await;
    malformed.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = malformed.json();
    assert_eq!(body["code"], "bad_request");

    assert_eq!(harness.stock_of(&comic).await, 3);
}

#[tokio::test]
async fn test_update_stock_unknown_comic_is_404() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/api/stock")
        .json(&json!({ "comicId": ComicId::generate().to_string(), "newStock": 4 }))
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_list_and_get_comics() {
    let harness = TestHarness::new();
    let first = harness.seed_comic("Bone #1", 200, 3).await;
    let second = harness.seed_comic("Bone #2", 250, 1).await;

    let body: Value = harness.server.get("/api/comics").await.json();
    let titles: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles.len(), 2);
    assert!(titles.contains(&first.title));
    assert!(titles.contains(&second.title));

    let response = harness
        .server
        .get(&format!("/api/comics/{}", second.id))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["price_cents"], 250);

    harness
        .server
        .get(&format!("/api/comics/{}", ComicId::generate()))
        .await
        .assert_status_not_found();
    harness
        .server
        .get("/api/comics/not-an-id")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cart_accumulates_quantities() {
    let harness = TestHarness::new();
    let buyer = harness.seed_profile("ada").await;
    let comic = harness.seed_comic("Bone #1", 200, 3).await;

    let added = harness
        .server
        .post("/api/cart")
        .json(&json!({ "userId": buyer.user_id.to_string(), "comicId": comic.id.to_string() }))
        .await;
    added.assert_status_ok();
    let body: Value = added.json();
    assert_eq!(body["quantity"], 1);

    let added: Value = harness
        .server
        .post("/api/cart")
        .json(&json!({
            "userId": buyer.user_id.to_string(),
            "comicId": comic.id.to_string(),
            "quantity": 2
        }))
        .await
        .json();
    assert_eq!(added["quantity"], 3);

    let cart: Value = harness
        .server
        .get("/api/cart")
        .add_query_param("userId", buyer.user_id.to_string())
        .await
        .json();
    let items = cart["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 3);
    assert_eq!(items[0]["comic"]["title"], "Bone #1");
}

#[tokio::test]
async fn test_cart_rejects_bad_rows() {
    let harness = TestHarness::new();
    let user = UserId::generate();

    harness
        .server
        .post("/api/cart")
        .json(&json!({
            "userId": user.to_string(),
            "comicId": ComicId::generate().to_string()
        }))
        .await
        .assert_status_not_found();

    let comic = harness.seed_comic("Bone #1", 200, 3).await;
    harness
        .server
        .post("/api/cart")
        .json(&json!({
            "userId": user.to_string(),
            "comicId": comic.id.to_string(),
            "quantity": 0
        }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    harness
        .server
        .get("/api/cart")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
