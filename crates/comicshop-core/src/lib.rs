//! Core types and utilities for comicshop.
//!
//! This crate provides the domain types shared by the store, the HTTP service
//! and the client SDK:
//!
//! - **Identifiers**: `UserId`, `ComicId`, `OrderId`, `ReceiptId`
//! - **Catalog**: `Profile`, `Comic`
//! - **Orders**: `WishlistItem`, `OrderItem`, `NewOrder`, `Order`, `StockDecrement`
//! - **Receipts**: `Receipt`, `IssuedReceipt`
//! - **Cart**: `CartItem`
//! - **Checkout pricing**: `CheckoutSummary`
//!
//! # Money
//!
//! Amounts are `i64` minor units (cents for USD). Major-unit prices from the
//! storefront are converted once, by [`money::to_minor_units`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod ids;
pub mod money;
pub mod order;
pub mod receipt;

pub use cart::CartItem;
pub use catalog::{Comic, Profile};
pub use checkout::{reconcile_stock, CheckoutLine, CheckoutSummary};
pub use error::{Result, ShopError};
pub use ids::{ComicId, IdError, OrderId, ReceiptId, UserId};
pub use order::{ComicSnapshot, NewOrder, Order, OrderItem, StockDecrement, WishlistItem};
pub use receipt::{IssuedReceipt, Receipt};
