//! Stripe integration.
//!
//! Stripe handles:
//! - Payment intents for checkout (create, cancel)
//! - Webhook signature verification for payment events

pub mod client;
pub mod types;

pub use client::StripeClient;
pub use client::StripeError;
pub use types::*;
