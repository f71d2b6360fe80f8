//! `PostgreSQL` storage implementation.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{query, PgPool, Postgres, Row, Transaction};

use comicshop_core::{
    CartItem, Comic, ComicId, IssuedReceipt, NewOrder, Order, OrderId, OrderItem, Profile,
    Receipt, ReceiptId, StockDecrement, UserId,
};

use crate::error::{Result, StoreError};
use crate::Store;

const COMIC_COLUMNS: &str = "id, user_id, title, price_cents, currency, stock, image, \
                             description, created_at, updated_at";
const ORDER_COLUMNS: &str =
    "id, user_id, user_name, total_amount, currency, items, payment_intent_id, created_at";
const RECEIPT_COLUMNS: &str = "id, user_id, order_id, total_amount, currency, items, created_at";

const DECREMENT_STOCK_SQL: &str = "UPDATE comics SET stock = stock - $1, updated_at = now() \
                                   WHERE id = $2 AND stock >= $1 RETURNING stock";

/// `PostgreSQL`-backed storage.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `PostgreSQL`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        tracing::info!(max_connections, "connected to postgres");
        Ok(Self { pool })
    }

    /// Apply the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    async fn insert_order(tx: &mut Transaction<'_, Postgres>, order: &NewOrder) -> Result<Order> {
        let sql = format!(
            "INSERT INTO orders (id, user_id, user_name, total_amount, currency, items, \
             payment_intent_id) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {ORDER_COLUMNS}"
        );
        let row = query(&sql)
            .bind(order.id.to_string())
            .bind(*order.user_id.as_uuid())
            .bind(&order.user_name)
            .bind(order.total_amount)
            .bind(&order.currency)
            .bind(Json(&order.items))
            .bind(order.payment_intent_id.as_deref())
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| {
                StoreError::Database(format!("insert of order {} returned no row", order.id))
            })?;
        Ok(order_from_row(&row)?)
    }

    async fn decrement_stock(
        tx: &mut Transaction<'_, Postgres>,
        decrement: &StockDecrement,
    ) -> Result<i64> {
        let remaining: Option<i64> = query(DECREMENT_STOCK_SQL)
            .bind(decrement.quantity)
            .bind(*decrement.comic_id.as_uuid())
            .fetch_optional(&mut **tx)
            .await?
            .map(|row| row.try_get("stock"))
            .transpose()?;

        if let Some(remaining) = remaining {
            return Ok(remaining);
        }

        // No row matched: tell a missing comic apart from a short one.
        let available: Option<i64> = query("SELECT stock FROM comics WHERE id = $1")
            .bind(*decrement.comic_id.as_uuid())
            .fetch_optional(&mut **tx)
            .await?
            .map(|row| row.try_get("stock"))
            .transpose()?;

        match available {
            Some(available) => Err(StoreError::OutOfStock {
                comic_id: decrement.comic_id,
                requested: decrement.quantity,
                available,
            }),
            None => Err(StoreError::not_found("comic", decrement.comic_id)),
        }
    }

    async fn receipt_for_order(
        tx: &mut Transaction<'_, Postgres>,
        order_id: &OrderId,
    ) -> Result<Option<Receipt>> {
        let sql = format!("SELECT {RECEIPT_COLUMNS} FROM receipts WHERE order_id = $1");
        let row = query(&sql)
            .bind(order_id.to_string())
            .fetch_optional(&mut **tx)
            .await?;
        Ok(row.as_ref().map(receipt_from_row).transpose()?)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn put_profile(&self, profile: &Profile) -> Result<()> {
        query(
            "INSERT INTO profiles (user_id, username, created_at) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE SET username = EXCLUDED.username",
        )
        .bind(*profile.user_id.as_uuid())
        .bind(&profile.username)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_profile(&self, user_id: &UserId) -> Result<Option<Profile>> {
        let row = query("SELECT user_id, username, created_at FROM profiles WHERE user_id = $1")
            .bind(*user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(profile_from_row).transpose()?)
    }

    async fn put_comic(&self, comic: &Comic) -> Result<()> {
        query(
            "INSERT INTO comics (id, user_id, title, price_cents, currency, stock, image, \
             description, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (id) DO UPDATE SET title = EXCLUDED.title, \
             price_cents = EXCLUDED.price_cents, currency = EXCLUDED.currency, \
             stock = EXCLUDED.stock, image = EXCLUDED.image, \
             description = EXCLUDED.description, updated_at = EXCLUDED.updated_at",
        )
        .bind(*comic.id.as_uuid())
        .bind(*comic.user_id.as_uuid())
        .bind(&comic.title)
        .bind(comic.price_cents)
        .bind(&comic.currency)
        .bind(comic.stock)
        .bind(comic.image.as_deref())
        .bind(comic.description.as_deref())
        .bind(comic.created_at)
        .bind(comic.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_comic(&self, comic_id: &ComicId) -> Result<Option<Comic>> {
        let sql = format!("SELECT {COMIC_COLUMNS} FROM comics WHERE id = $1");
        let row = query(&sql)
            .bind(*comic_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(comic_from_row).transpose()?)
    }

    async fn list_comics(&self, limit: usize, offset: usize) -> Result<Vec<Comic>> {
        let sql = format!(
            "SELECT {COMIC_COLUMNS} FROM comics ORDER BY created_at, id LIMIT $1 OFFSET $2"
        );
        let rows = query(&sql)
            .bind(to_i64(limit))
            .bind(to_i64(offset))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(comic_from_row).collect::<sqlx::Result<_>>()?)
    }

    async fn set_stock(&self, comic_id: &ComicId, resulting_stock: i64) -> Result<Comic> {
        if resulting_stock < 0 {
            return Err(StoreError::Constraint(format!(
                "comic {comic_id} stock must be >= 0"
            )));
        }
        let sql = format!(
            "UPDATE comics SET stock = $1, updated_at = now() WHERE id = $2 \
             RETURNING {COMIC_COLUMNS}"
        );
        let row = query(&sql)
            .bind(resulting_stock)
            .bind(*comic_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("comic", comic_id))?;
        Ok(comic_from_row(&row)?)
    }

    async fn place_order(&self, order: NewOrder, decrements: &[StockDecrement]) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let stored = Self::insert_order(&mut tx, &order).await?;
        // Row locks are taken in comic id order.
        for decrement in &StockDecrement::merge(decrements.iter().copied()) {
            let remaining = Self::decrement_stock(&mut tx, decrement).await?;
            tracing::debug!(
                order_id = %stored.id,
                comic_id = %decrement.comic_id,
                quantity = decrement.quantity,
                remaining,
                "stock decremented"
            );
        }

        tx.commit().await?;
        Ok(stored)
    }

    async fn get_order(&self, order_id: &OrderId) -> Result<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let row = query(&sql)
            .bind(order_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(order_from_row).transpose()?)
    }

    async fn list_orders_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        let rows = query(&sql)
            .bind(*user_id.as_uuid())
            .bind(to_i64(limit))
            .bind(to_i64(offset))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(order_from_row).collect::<sqlx::Result<_>>()?)
    }

    async fn issue_receipt(&self, receipt: Receipt) -> Result<IssuedReceipt> {
        let mut tx = self.pool.begin().await?;

        if let Some(existing) = Self::receipt_for_order(&mut tx, &receipt.order_id).await? {
            return Ok(IssuedReceipt {
                receipt: existing,
                already_processed: true,
            });
        }

        let order_exists = query("SELECT 1 FROM orders WHERE id = $1")
            .bind(receipt.order_id.to_string())
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !order_exists {
            return Err(StoreError::not_found("order", receipt.order_id));
        }

        let inserted = query(
            "INSERT INTO receipts (id, user_id, order_id, total_amount, currency, items, \
             created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(receipt.id.to_string())
        .bind(*receipt.user_id.as_uuid())
        .bind(receipt.order_id.to_string())
        .bind(receipt.total_amount)
        .bind(&receipt.currency)
        .bind(Json(&receipt.items))
        .bind(receipt.created_at)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                // Lost the race against a concurrent confirmation.
                drop(tx);
                let existing = self
                    .get_receipt_by_order(&receipt.order_id)
                    .await?
                    .ok_or_else(|| StoreError::not_found("receipt", receipt.order_id))?;
                return Ok(IssuedReceipt {
                    receipt: existing,
                    already_processed: true,
                });
            }
            Err(e) => return Err(e.into()),
        }

        let cleared = query("DELETE FROM cart WHERE user_id = $1")
            .bind(*receipt.user_id.as_uuid())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        tracing::debug!(order_id = %receipt.order_id, cleared, "cart cleared");

        Ok(IssuedReceipt {
            receipt,
            already_processed: false,
        })
    }

    async fn get_receipt_by_order(&self, order_id: &OrderId) -> Result<Option<Receipt>> {
        let sql = format!("SELECT {RECEIPT_COLUMNS} FROM receipts WHERE order_id = $1");
        let row = query(&sql)
            .bind(order_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(receipt_from_row).transpose()?)
    }

    async fn add_to_cart(&self, item: &CartItem) -> Result<CartItem> {
        let row = query(
            "INSERT INTO cart (user_id, comic_id, quantity, added_at) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id, comic_id) DO UPDATE \
             SET quantity = cart.quantity + EXCLUDED.quantity \
             RETURNING user_id, comic_id, quantity, added_at",
        )
        .bind(*item.user_id.as_uuid())
        .bind(*item.comic_id.as_uuid())
        .bind(item.quantity)
        .bind(item.added_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(cart_item_from_row(&row)?)
    }

    async fn list_cart(&self, user_id: &UserId) -> Result<Vec<CartItem>> {
        let rows = query(
            "SELECT user_id, comic_id, quantity, added_at FROM cart WHERE user_id = $1 \
             ORDER BY added_at, comic_id",
        )
        .bind(*user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(cart_item_from_row)
            .collect::<sqlx::Result<_>>()?)
    }

    async fn clear_cart(&self, user_id: &UserId) -> Result<u64> {
        let rows_affected = query("DELETE FROM cart WHERE user_id = $1")
            .bind(*user_id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows_affected)
    }
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn parse_id<T>(row: &PgRow, column: &str) -> sqlx::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.try_get(column)?;
    T::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn profile_from_row(row: &PgRow) -> sqlx::Result<Profile> {
    Ok(Profile {
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        username: row.try_get("username")?,
        created_at: row.try_get("created_at")?,
    })
}

fn comic_from_row(row: &PgRow) -> sqlx::Result<Comic> {
    Ok(Comic {
        id: ComicId::from_uuid(row.try_get("id")?),
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        title: row.try_get("title")?,
        price_cents: row.try_get("price_cents")?,
        currency: row.try_get("currency")?,
        stock: row.try_get("stock")?,
        image: row.try_get("image")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn order_from_row(row: &PgRow) -> sqlx::Result<Order> {
    let items: Json<Vec<OrderItem>> = row.try_get("items")?;
    Ok(Order {
        id: parse_id::<OrderId>(row, "id")?,
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        user_name: row.try_get("user_name")?,
        total_amount: row.try_get("total_amount")?,
        currency: row.try_get("currency")?,
        items: items.0,
        payment_intent_id: row.try_get("payment_intent_id")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn receipt_from_row(row: &PgRow) -> sqlx::Result<Receipt> {
    let items: Json<Vec<OrderItem>> = row.try_get("items")?;
    Ok(Receipt {
        id: parse_id::<ReceiptId>(row, "id")?,
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        order_id: parse_id::<OrderId>(row, "order_id")?,
        total_amount: row.try_get("total_amount")?,
        currency: row.try_get("currency")?,
        items: items.0,
        created_at: row.try_get("created_at")?,
    })
}

fn cart_item_from_row(row: &PgRow) -> sqlx::Result<CartItem> {
    Ok(CartItem {
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        comic_id: ComicId::from_uuid(row.try_get("comic_id")?),
        quantity: row.try_get("quantity")?,
        added_at: row.try_get("added_at")?,
    })
}
