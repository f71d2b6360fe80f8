//! `RocksDB` storage implementation.
//!
//! Values are CBOR-encoded. Compound operations read under a process-wide
//! write lock and commit through a single `WriteBatch`, so a crash or a
//! failed check never leaves half of an order or receipt behind.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};

use comicshop_core::{
    CartItem, Comic, ComicId, IssuedReceipt, NewOrder, Order, OrderId, Profile, Receipt,
    StockDecrement, UserId,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::Store;

/// RocksDB-backed storage.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, descriptors).map_err(db_err)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Database("write lock poisoned".into()))
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn get<T: serde::de::DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(db_err)?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn put<T: serde::Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let value = Self::serialize(value)?;
        self.db.put_cf(&cf, key, value).map_err(db_err)
    }

    /// Keys and values under `prefix`, in key order.
    fn scan_prefix(&self, cf_name: &str, prefix: &[u8]) -> Result<Vec<(Box<[u8]>, Box<[u8]>)>> {
        let cf = self.cf(cf_name)?;
        let mut entries = Vec::new();
        for item in self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix, Direction::Forward))
        {
            let (key, value) = item.map_err(db_err)?;
            if !key.starts_with(prefix) {
                break;
            }
            entries.push((key, value));
        }
        Ok(entries)
    }

    fn put_comic_locked(&self, comic: &Comic) -> Result<()> {
        if comic.stock < 0 {
            return Err(StoreError::Constraint(format!(
                "comic {} stock must be >= 0",
                comic.id
            )));
        }
        let _guard = self.lock()?;
        self.put(cf::COMICS, &keys::comic_key(&comic.id), comic)
    }

    fn set_stock_locked(&self, comic_id: &ComicId, resulting_stock: i64) -> Result<Comic> {
        if resulting_stock < 0 {
            return Err(StoreError::Constraint(format!(
                "comic {comic_id} stock must be >= 0"
            )));
        }
        let _guard = self.lock()?;
        let key = keys::comic_key(comic_id);
        let mut comic: Comic = self
            .get(cf::COMICS, &key)?
            .ok_or_else(|| StoreError::not_found("comic", comic_id))?;
        comic.stock = resulting_stock;
        comic.updated_at = Utc::now();
        self.put(cf::COMICS, &key, &comic)?;
        Ok(comic)
    }

    fn place_order_locked(&self, order: NewOrder, decrements: &[StockDecrement]) -> Result<Order> {
        let _guard = self.lock()?;
        let now = Utc::now();

        let mut updated = Vec::with_capacity(decrements.len());
        for decrement in decrements {
            let mut comic: Comic = self
                .get(cf::COMICS, &keys::comic_key(&decrement.comic_id))?
                .ok_or_else(|| StoreError::not_found("comic", decrement.comic_id))?;
            if comic.stock < decrement.quantity {
                return Err(StoreError::OutOfStock {
                    comic_id: decrement.comic_id,
                    requested: decrement.quantity,
                    available: comic.stock,
                });
            }
            comic.stock -= decrement.quantity;
            comic.updated_at = now;
            updated.push(comic);
        }

        let order = order.into_order(now);

        let cf_comics = self.cf(cf::COMICS)?;
        let cf_orders = self.cf(cf::ORDERS)?;
        let cf_by_user = self.cf(cf::ORDERS_BY_USER)?;

        let mut batch = WriteBatch::default();
        for comic in &updated {
            batch.put_cf(&cf_comics, keys::comic_key(&comic.id), Self::serialize(comic)?);
        }
        batch.put_cf(&cf_orders, keys::order_key(&order.id), Self::serialize(&order)?);
        batch.put_cf(&cf_by_user, keys::user_order_key(&order.user_id, &order.id), []);

        self.db.write(batch).map_err(db_err)?;
        Ok(order)
    }

    fn issue_receipt_locked(&self, receipt: Receipt) -> Result<IssuedReceipt> {
        let _guard = self.lock()?;
        let order_key = keys::order_key(&receipt.order_id);

        if let Some(existing) = self.get::<Receipt>(cf::RECEIPTS_BY_ORDER, &order_key)? {
            return Ok(IssuedReceipt {
                receipt: existing,
                already_processed: true,
            });
        }
        if self.get::<Order>(cf::ORDERS, &order_key)?.is_none() {
            return Err(StoreError::not_found("order", receipt.order_id));
        }

        let cart_rows = self.scan_prefix(cf::CART, &keys::user_prefix(&receipt.user_id))?;
        let cf_receipts = self.cf(cf::RECEIPTS_BY_ORDER)?;
        let cf_cart = self.cf(cf::CART)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_receipts, &order_key, Self::serialize(&receipt)?);
        for (key, _) in &cart_rows {
            batch.delete_cf(&cf_cart, key);
        }

        self.db.write(batch).map_err(db_err)?;
        tracing::debug!(order_id = %receipt.order_id, cleared = cart_rows.len(), "cart cleared");

        Ok(IssuedReceipt {
            receipt,
            already_processed: false,
        })
    }

    fn add_to_cart_locked(&self, item: &CartItem) -> Result<CartItem> {
        if item.quantity <= 0 {
            return Err(StoreError::Constraint(
                "cart quantity must be positive".into(),
            ));
        }
        let _guard = self.lock()?;
        let key = keys::cart_key(&item.user_id, &item.comic_id);
        let row = match self.get::<CartItem>(cf::CART, &key)? {
            Some(mut existing) => {
                existing.quantity += item.quantity;
                existing
            }
            None => item.clone(),
        };
        self.put(cf::CART, &key, &row)?;
        Ok(row)
    }

    fn clear_cart_locked(&self, user_id: &UserId) -> Result<u64> {
        let _guard = self.lock()?;
        let rows = self.scan_prefix(cf::CART, &keys::user_prefix(user_id))?;
        let cf_cart = self.cf(cf::CART)?;

        let mut batch = WriteBatch::default();
        for (key, _) in &rows {
            batch.delete_cf(&cf_cart, key);
        }
        self.db.write(batch).map_err(db_err)?;
        Ok(rows.len() as u64)
    }
}

#[allow(clippy::needless_pass_by_value)]
fn db_err(e: rocksdb::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

#[async_trait]
impl Store for RocksStore {
    async fn put_profile(&self, profile: &Profile) -> Result<()> {
        self.put(cf::PROFILES, &keys::profile_key(&profile.user_id), profile)
    }

    async fn get_profile(&self, user_id: &UserId) -> Result<Option<Profile>> {
        self.get(cf::PROFILES, &keys::profile_key(user_id))
    }

    async fn put_comic(&self, comic: &Comic) -> Result<()> {
        self.put_comic_locked(comic)
    }

    async fn get_comic(&self, comic_id: &ComicId) -> Result<Option<Comic>> {
        self.get(cf::COMICS, &keys::comic_key(comic_id))
    }

    async fn list_comics(&self, limit: usize, offset: usize) -> Result<Vec<Comic>> {
        let mut comics = self
            .scan_prefix(cf::COMICS, &[])?
            .iter()
            .map(|(_, value)| Self::deserialize::<Comic>(value))
            .collect::<Result<Vec<_>>>()?;
        comics.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(comics.into_iter().skip(offset).take(limit).collect())
    }

    async fn set_stock(&self, comic_id: &ComicId, resulting_stock: i64) -> Result<Comic> {
        self.set_stock_locked(comic_id, resulting_stock)
    }

    async fn place_order(&self, order: NewOrder, decrements: &[StockDecrement]) -> Result<Order> {
        self.place_order_locked(order, decrements)
    }

    async fn get_order(&self, order_id: &OrderId) -> Result<Option<Order>> {
        self.get(cf::ORDERS, &keys::order_key(order_id))
    }

    async fn list_orders_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Order>> {
        let index = self.scan_prefix(cf::ORDERS_BY_USER, &keys::user_prefix(user_id))?;

        let mut orders = Vec::new();
        for (key, _) in index.iter().rev().skip(offset) {
            if orders.len() >= limit {
                break;
            }
            let Some(order_id) = keys::order_id_from_user_key(key) else {
                continue;
            };
            if let Some(order) = self.get(cf::ORDERS, &keys::order_key(&order_id))? {
                orders.push(order);
            }
        }
        Ok(orders)
    }

    async fn issue_receipt(&self, receipt: Receipt) -> Result<IssuedReceipt> {
        self.issue_receipt_locked(receipt)
    }

    async fn get_receipt_by_order(&self, order_id: &OrderId) -> Result<Option<Receipt>> {
        self.get(cf::RECEIPTS_BY_ORDER, &keys::order_key(order_id))
    }

    async fn add_to_cart(&self, item: &CartItem) -> Result<CartItem> {
        self.add_to_cart_locked(item)
    }

    async fn list_cart(&self, user_id: &UserId) -> Result<Vec<CartItem>> {
        let mut items = self
            .scan_prefix(cf::CART, &keys::user_prefix(user_id))?
            .iter()
            .map(|(_, value)| Self::deserialize::<CartItem>(value))
            .collect::<Result<Vec<_>>>()?;
        items.sort_by(|a, b| (a.added_at, a.comic_id).cmp(&(b.added_at, b.comic_id)));
        Ok(items)
    }

    async fn clear_cart(&self, user_id: &UserId) -> Result<u64> {
        self.clear_cart_locked(user_id)
    }
}
