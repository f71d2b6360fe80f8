//! In-memory storage implementation.
//!
//! All tables live behind one `tokio::sync::Mutex`, so every trait method is
//! atomic with respect to every other.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use comicshop_core::{
    CartItem, Comic, ComicId, IssuedReceipt, NewOrder, Order, OrderId, Profile, Receipt,
    StockDecrement, UserId,
};

use crate::error::{Result, StoreError};
use crate::Store;

#[derive(Debug, Default)]
struct Tables {
    profiles: HashMap<UserId, Profile>,
    comics: HashMap<ComicId, Comic>,
    orders: BTreeMap<OrderId, Order>,
    receipts_by_order: HashMap<OrderId, Receipt>,
    cart: Vec<CartItem>,
}

/// Process-local storage backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of receipts stored.
    pub async fn receipt_count(&self) -> usize {
        self.tables.lock().await.receipts_by_order.len()
    }

    /// Number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.tables.lock().await.orders.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn put_profile(&self, profile: &Profile) -> Result<()> {
        let mut tables = self.tables.lock().await;
        tables.profiles.insert(profile.user_id, profile.clone());
        Ok(())
    }

    async fn get_profile(&self, user_id: &UserId) -> Result<Option<Profile>> {
        Ok(self.tables.lock().await.profiles.get(user_id).cloned())
    }

    async fn put_comic(&self, comic: &Comic) -> Result<()> {
        if comic.stock < 0 {
            return Err(StoreError::Constraint(format!(
                "comic {} stock must be >= 0",
                comic.id
            )));
        }
        let mut tables = self.tables.lock().await;
        tables.comics.insert(comic.id, comic.clone());
        Ok(())
    }

    async fn get_comic(&self, comic_id: &ComicId) -> Result<Option<Comic>> {
        Ok(self.tables.lock().await.comics.get(comic_id).cloned())
    }

    async fn list_comics(&self, limit: usize, offset: usize) -> Result<Vec<Comic>> {
        let tables = self.tables.lock().await;
        let mut comics: Vec<&Comic> = tables.comics.values().collect();
        comics.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(comics
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn set_stock(&self, comic_id: &ComicId, resulting_stock: i64) -> Result<Comic> {
        if resulting_stock < 0 {
            return Err(StoreError::Constraint(format!(
                "comic {comic_id} stock must be >= 0"
            )));
        }
        let mut tables = self.tables.lock().await;
        let comic = tables
            .comics
            .get_mut(comic_id)
            .ok_or_else(|| StoreError::not_found("comic", comic_id))?;
        comic.stock = resulting_stock;
        comic.updated_at = Utc::now();
        Ok(comic.clone())
    }

    async fn place_order(&self, order: NewOrder, decrements: &[StockDecrement]) -> Result<Order> {
        let mut tables = self.tables.lock().await;

        // Check every decrement before applying any of them.
        for decrement in decrements {
            let comic = tables
                .comics
                .get(&decrement.comic_id)
                .ok_or_else(|| StoreError::not_found("comic", decrement.comic_id))?;
            if comic.stock < decrement.quantity {
                return Err(StoreError::OutOfStock {
                    comic_id: decrement.comic_id,
                    requested: decrement.quantity,
                    available: comic.stock,
                });
            }
        }

        let now = Utc::now();
        for decrement in decrements {
            if let Some(comic) = tables.comics.get_mut(&decrement.comic_id) {
                comic.stock -= decrement.quantity;
                comic.updated_at = now;
            }
        }

        let order = order.into_order(now);
        tables.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, order_id: &OrderId) -> Result<Option<Order>> {
        Ok(self.tables.lock().await.orders.get(order_id).cloned())
    }

    async fn list_orders_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Order>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .orders
            .values()
            .rev()
            .filter(|order| order.user_id == *user_id)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn issue_receipt(&self, receipt: Receipt) -> Result<IssuedReceipt> {
        let mut tables = self.tables.lock().await;

        if let Some(existing) = tables.receipts_by_order.get(&receipt.order_id) {
            return Ok(IssuedReceipt {
                receipt: existing.clone(),
                already_processed: true,
            });
        }
        if !tables.orders.contains_key(&receipt.order_id) {
            return Err(StoreError::not_found("order", receipt.order_id));
        }

        let owner = receipt.user_id;
        tables.cart.retain(|item| item.user_id != owner);
        tables
            .receipts_by_order
            .insert(receipt.order_id, receipt.clone());

        Ok(IssuedReceipt {
            receipt,
            already_processed: false,
        })
    }

    async fn get_receipt_by_order(&self, order_id: &OrderId) -> Result<Option<Receipt>> {
        Ok(self
            .tables
            .lock()
            .await
            .receipts_by_order
            .get(order_id)
            .cloned())
    }

    async fn add_to_cart(&self, item: &CartItem) -> Result<CartItem> {
        if item.quantity <= 0 {
            return Err(StoreError::Constraint(
                "cart quantity must be positive".into(),
            ));
        }
        let mut tables = self.tables.lock().await;
        if let Some(existing) = tables
            .cart
            .iter_mut()
            .find(|row| row.user_id == item.user_id && row.comic_id == item.comic_id)
        {
            existing.quantity += item.quantity;
            return Ok(existing.clone());
        }
        tables.cart.push(item.clone());
        Ok(item.clone())
    }

    async fn list_cart(&self, user_id: &UserId) -> Result<Vec<CartItem>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .cart
            .iter()
            .filter(|row| row.user_id == *user_id)
            .cloned()
            .collect())
    }

    async fn clear_cart(&self, user_id: &UserId) -> Result<u64> {
        let mut tables = self.tables.lock().await;
        let before = tables.cart.len();
        tables.cart.retain(|row| row.user_id != *user_id);
        Ok((before - tables.cart.len()) as u64)
    }
}
