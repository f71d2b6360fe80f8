//! Router configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{cart, catalog, health, orders, receipts, stock, webhooks};
use crate::state::AppState;

/// Maximum concurrent requests for the storefront API.
const API_MAX_CONCURRENT_REQUESTS: usize = 64;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// - `GET /health` - Health check
/// - `POST /api/orders` - Check out a wishlist
/// - `GET /api/orders` - A buyer's order history
/// - `POST /api/stock` - Overwrite a comic's stock
/// - `GET /api/payment-success` - Issue the receipt for a paid order
/// - `GET /api/receipt` - An order with its receipt
/// - `GET /api/comics`, `GET /api/comics/:id` - Catalogue
/// - `GET /api/cart`, `POST /api/cart` - Cart
/// - `POST /webhooks/stripe` - Stripe webhooks
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.cors_origins);
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let state = Arc::new(state);

    let api_routes = Router::new()
        .route("/orders", post(orders::create_order).get(orders::list_orders))
        .route("/stock", post(stock::update_stock))
        .route("/payment-success", get(receipts::payment_success))
        .route("/receipt", get(receipts::get_receipt))
        .route("/comics", get(catalog::list_comics))
        .route("/comics/:id", get(catalog::get_comic))
        .route("/cart", get(cart::get_cart).post(cart::add_to_cart))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", api_routes)
        // Webhooks are paced by Stripe, not by us.
        .route("/webhooks/stripe", post(webhooks::stripe_webhook))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
