//! Orders and the wishlist items they are built from.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{ComicId, OrderId, UserId};

/// One line of a checkout request, as sent by the storefront.
///
/// Every field is optional on the wire so that missing values surface as
/// validation errors rather than body-parsing failures. The wire name `stock`
/// carries the quantity the buyer wants, not the comic's inventory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WishlistItem {
    /// Client-side wishlist row ID (string or number).
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    /// The comic being bought.
    #[serde(default, alias = "comicId")]
    pub comic_id: Option<String>,
    /// Title snapshot.
    #[serde(default)]
    pub title: Option<String>,
    /// Units the buyer wants.
    #[serde(default, rename = "stock", alias = "quantity")]
    pub requested_quantity: Option<i64>,
    /// Price and currency snapshot of the comic.
    #[serde(default)]
    pub comic: Option<ComicSnapshot>,
}

/// The comic fields a wishlist item carries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComicSnapshot {
    /// Comic ID, if the storefront sent it here rather than on the item.
    #[serde(default)]
    pub id: Option<String>,
    /// Title.
    #[serde(default)]
    pub title: Option<String>,
    /// Unit price in major units.
    #[serde(default)]
    pub price: Option<Decimal>,
    /// Currency code.
    #[serde(default)]
    pub currency: Option<String>,
    /// Cover image URL.
    #[serde(default, alias = "image_url")]
    pub image: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// An order line, priced in minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Client-side wishlist row ID, if one was sent.
    pub id: Option<String>,
    /// The comic bought.
    pub comic_id: ComicId,
    /// Title at the time of purchase.
    pub title: String,
    /// Unit price in minor units.
    pub price: i64,
    /// Lower-case currency code.
    pub currency: String,
    /// Cover image URL.
    pub image: Option<String>,
    /// Units bought.
    pub quantity: i64,
}

/// An order as it is about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    /// Pre-generated order ID, shared with the payment intent's metadata.
    pub id: OrderId,
    /// Buyer.
    pub user_id: UserId,
    /// Buyer's display name.
    pub user_name: String,
    /// Total in minor units.
    pub total_amount: i64,
    /// Lower-case currency code.
    pub currency: String,
    /// Lines, in wishlist order.
    pub items: Vec<OrderItem>,
    /// Payment intent created for this order.
    pub payment_intent_id: Option<String>,
}

impl NewOrder {
    /// Stamp the order with its creation time.
    #[must_use]
    pub fn into_order(self, created_at: DateTime<Utc>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            user_name: self.user_name,
            total_amount: self.total_amount,
            currency: self.currency,
            items: self.items,
            payment_intent_id: self.payment_intent_id,
            created_at,
        }
    }
}

/// A stored order. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order ID.
    pub id: OrderId,
    /// Buyer.
    pub user_id: UserId,
    /// Buyer's display name.
    pub user_name: String,
    /// Total in minor units.
    pub total_amount: i64,
    /// Lower-case currency code.
    pub currency: String,
    /// Lines.
    pub items: Vec<OrderItem>,
    /// Payment intent created for this order.
    pub payment_intent_id: Option<String>,
    /// When the order was stored.
    pub created_at: DateTime<Utc>,
}

/// Subtract `quantity` units of `comic_id`, only if that many are in stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDecrement {
    /// Comic to decrement.
    pub comic_id: ComicId,
    /// Units to subtract. Always positive.
    pub quantity: i64,
}

impl StockDecrement {
    /// Create a decrement.
    #[must_use]
    pub const fn new(comic_id: ComicId, quantity: i64) -> Self {
        Self { comic_id, quantity }
    }

    /// Combine decrements for the same comic, sorted by comic id.
    ///
    /// Stores apply decrements in this order, so concurrent orders lock rows
    /// in the same sequence.
    #[must_use]
    pub fn merge(decrements: impl IntoIterator<Item = Self>) -> Vec<Self> {
        let mut merged: Vec<Self> = Vec::new();
        for decrement in decrements {
            match merged.iter_mut().find(|d| d.comic_id == decrement.comic_id) {
                Some(existing) => existing.quantity += decrement.quantity,
                None => merged.push(decrement),
            }
        }
        merged.sort_by_key(|d| d.comic_id);
        merged
    }
}
