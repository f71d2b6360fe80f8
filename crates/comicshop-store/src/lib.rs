//! Storage layer for comicshop.
//!
//! This crate provides persistent storage for profiles, comics, orders,
//! receipts and carts behind the [`Store`] trait, with three backends:
//!
//! - [`PgStore`]: `PostgreSQL` via `sqlx`. Compound operations run in one
//!   transaction each.
//! - [`MemoryStore`]: in-process tables behind a single async mutex, for tests
//!   and local development.
//! - `RocksStore`: embedded `RocksDB` with column families, behind the
//!   `rocksdb-backend` feature.
//!
//! # Example
//!
//! ```no_run
//! use comicshop_core::{Comic, UserId};
//! use comicshop_store::{MemoryStore, Store};
//!
//! # async fn example() -> comicshop_store::Result<()> {
//! let store = MemoryStore::new();
//!
//! let comic = Comic::new(UserId::generate(), "Saga #1", 999, "usd", 10);
//! store.put_comic(&comic).await?;
//!
//! let comic = store.set_stock(&comic.id, 4).await?;
//! assert_eq!(comic.stock, 4);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;
pub mod postgres;

#[cfg(feature = "rocksdb-backend")]
pub mod keys;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
#[cfg(feature = "rocksdb-backend")]
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PgStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use async_trait::async_trait;
use comicshop_core::{
    CartItem, Comic, ComicId, IssuedReceipt, NewOrder, Order, OrderId, Profile, Receipt,
    StockDecrement, UserId,
};

/// The storage trait defining all database operations.
///
/// The workflow receives this as `&dyn Store`, so any backend (or a test
/// double) can be injected.
#[async_trait]
pub trait Store: Send + Sync {
    // =========================================================================
    // Profiles
    // =========================================================================

    /// Insert or replace a profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn put_profile(&self, profile: &Profile) -> Result<()>;

    /// Get a profile by user ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_profile(&self, user_id: &UserId) -> Result<Option<Profile>>;

    // =========================================================================
    // Comics
    // =========================================================================

    /// Insert or replace a comic listing.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Constraint` if the stock is negative.
    async fn put_comic(&self, comic: &Comic) -> Result<()>;

    /// Get a comic by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_comic(&self, comic_id: &ComicId) -> Result<Option<Comic>>;

    /// List comics, oldest listing first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_comics(&self, limit: usize, offset: usize) -> Result<Vec<Comic>>;

    /// Overwrite a comic's total stock (last writer wins).
    ///
    /// Returns the updated comic.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the comic doesn't exist.
    /// - `StoreError::Constraint` if `resulting_stock` is negative.
    async fn set_stock(&self, comic_id: &ComicId, resulting_stock: i64) -> Result<Comic>;

    // =========================================================================
    // Orders
    // =========================================================================

    /// Insert an order and apply its stock decrements atomically.
    ///
    /// Each decrement only applies if the comic has at least that many units;
    /// if any decrement cannot apply, nothing is written.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if a comic doesn't exist.
    /// - `StoreError::OutOfStock` if a comic cannot cover its decrement.
    async fn place_order(&self, order: NewOrder, decrements: &[StockDecrement]) -> Result<Order>;

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_order(&self, order_id: &OrderId) -> Result<Option<Order>>;

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_orders_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Order>>;

    // =========================================================================
    // Receipts
    // =========================================================================

    /// Record a receipt and clear the receipt owner's cart atomically.
    ///
    /// If a receipt already exists for the same order, it is returned with
    /// `already_processed = true` and nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the order doesn't exist.
    async fn issue_receipt(&self, receipt: Receipt) -> Result<IssuedReceipt>;

    /// Get the receipt issued for an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_receipt_by_order(&self, order_id: &OrderId) -> Result<Option<Receipt>>;

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add a comic to a cart, summing quantities if it is already there.
    ///
    /// Returns the resulting cart row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn add_to_cart(&self, item: &CartItem) -> Result<CartItem>;

    /// List a user's cart, in the order comics were added.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_cart(&self, user_id: &UserId) -> Result<Vec<CartItem>>;

    /// Delete every cart row for a user. Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn clear_cart(&self, user_id: &UserId) -> Result<u64>;
}
