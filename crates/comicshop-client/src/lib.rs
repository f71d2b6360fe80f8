//! Comicshop Client SDK.
//!
//! A typed client for the storefront API: checkout, order history, payment
//! confirmation, receipts, stock, catalogue and cart.
//!
//! # Example
//!
//! ```no_run
//! use comicshop_client::{ComicshopClient, UserId, WishlistItem};
//!
//! # async fn example(wishlist: Vec<WishlistItem>) -> Result<(), comicshop_client::ClientError> {
//! let client = ComicshopClient::new("http://comicshop:8080")?;
//! let buyer: UserId = "6f1c2c9e-7d3b-4a51-9a0e-3c7c1e0f5b2a".parse().expect("valid id");
//!
//! let placed = client.place_order(buyer, wishlist).await?;
//! println!("confirm payment with {}", placed.client_secret);
//!
//! // After the payment provider redirects back:
//! let confirmed = client.payment_success(placed.order_id, buyer).await?;
//! println!("receipt {}", confirmed.receipt_id);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, ComicshopClient};
pub use error::ClientError;
pub use types::*;

pub use comicshop_core::{
    CartItem, Comic, ComicId, ComicSnapshot, Order, OrderId, OrderItem, Receipt, ReceiptId,
    UserId, WishlistItem,
};
