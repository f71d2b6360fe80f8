//! Common test utilities for comicshop integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use serde_json::{json, Value};

use comicshop_core::{Comic, Profile, ShopError, UserId};
use comicshop_service::gateway::CreatedIntent;
use comicshop_service::{
    create_router, AppState, PaymentGateway, PaymentIntentRequest, ServiceConfig,
};
use comicshop_store::{MemoryStore, Store};

/// Payment gateway double that records every call.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    created: Mutex<Vec<PaymentIntentRequest>>,
    cancelled: Mutex<Vec<String>>,
    fail_create: AtomicBool,
    cancel_delay_ms: AtomicU64,
}

impl RecordingGateway {
    /// A gateway that succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later intent creation fail.
    pub fn fail_creates(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }

    /// Make every later cancellation take `delay` before it is recorded.
    pub fn delay_cancels(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.cancel_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Intents requested so far.
    pub fn created(&self) -> Vec<PaymentIntentRequest> {
        self.created.lock().unwrap().clone()
    }

    /// Intent IDs cancelled so far.
    pub fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<CreatedIntent, ShopError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(ShopError::Gateway("card network unavailable".into()));
        }
        let mut created = self.created.lock().unwrap();
        created.push(request.clone());
        let id = format!("pi_test_{}", created.len());
        Ok(CreatedIntent {
            client_secret: format!("{id}_secret"),
            id,
        })
    }

    async fn cancel_payment_intent(&self, intent_id: &str) -> Result<(), ShopError> {
        let delay = self.cancel_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.cancelled.lock().unwrap().push(intent_id.to_string());
        Ok(())
    }
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The store behind the server.
    pub store: Arc<MemoryStore>,
    /// The gateway behind the server.
    pub gateway: Arc<RecordingGateway>,
}

impl TestHarness {
    /// Create a new test harness with an empty store.
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Create a harness with a custom configuration.
    pub fn with_config(config: ServiceConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let gateway = Arc::new(RecordingGateway::new());

        let state = AppState::new(store.clone(), config).with_gateway(gateway.clone());
        let server = TestServer::new(create_router(state)).expect("Failed to create test server");

        Self {
            server,
            store,
            gateway,
        }
    }

    /// Store a buyer profile.
    pub async fn seed_profile(&self, username: &str) -> Profile {
        let profile = Profile::new(UserId::generate(), username);
        self.store.put_profile(&profile).await.unwrap();
        profile
    }

    /// Store a comic for sale.
    pub async fn seed_comic(&self, title: &str, price_cents: i64, stock: i64) -> Comic {
        let comic = Comic::new(UserId::generate(), title, price_cents, "usd", stock);
        self.store.put_comic(&comic).await.unwrap();
        comic
    }

    /// Current stock of a comic.
    pub async fn stock_of(&self, comic: &Comic) -> i64 {
        self.store.get_comic(&comic.id).await.unwrap().unwrap().stock
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for tests: no Stripe, permissive CORS.
pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        listen_addr: "127.0.0.1:0".into(),
        ..ServiceConfig::default()
    }
}

/// A wishlist item as the storefront sends it.
pub fn wishlist_item(comic: &Comic, price: &str, quantity: i64) -> Value {
    json!({
        "id": 1,
        "comic_id": comic.id.to_string(),
        "title": comic.title,
        "stock": quantity,
        "comic": {
            "title": comic.title,
            "price": price.parse::<f64>().unwrap(),
            "currency": "usd",
            "image_url": "https://img.example/cover.jpg"
        }
    })
}
