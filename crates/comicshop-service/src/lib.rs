//! Comicshop HTTP API Service.
//!
//! This crate provides the storefront's order and payment API:
//!
//! - Checkout: wishlist pricing, payment intent creation, order creation and
//!   stock reconciliation
//! - Receipt issuance once a payment is confirmed (redirect or webhook)
//! - Administrative stock updates
//! - Catalogue and cart reads
//!
//! The workflow functions in [`checkout`] take the store and the payment
//! gateway as trait objects, so tests run them against `MemoryStore` and a
//! fake gateway.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)]

pub mod checkout;
pub mod config;
pub mod crypto;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod stripe;

pub use checkout::{
    handle_payment_success, place_order, place_order_detached, PaymentConfirmation, PlacedOrder,
};
pub use config::{ServiceConfig, StoreBackend};
pub use error::ApiError;
pub use gateway::{PaymentGateway, PaymentIntentRequest};
pub use routes::create_router;
pub use state::AppState;
pub use stripe::{StripeClient, StripeError};
