//! Receipts issued after a payment is confirmed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Order, OrderId, OrderItem, ReceiptId, UserId};

/// The durable record of a paid order. At most one exists per order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Receipt ID.
    pub id: ReceiptId,
    /// Buyer the receipt was issued to.
    pub user_id: UserId,
    /// The paid order.
    pub order_id: OrderId,
    /// Total in minor units, copied from the order.
    pub total_amount: i64,
    /// Lower-case currency code, copied from the order.
    pub currency: String,
    /// Lines, copied from the order.
    pub items: Vec<OrderItem>,
    /// When the receipt was issued.
    pub created_at: DateTime<Utc>,
}

impl Receipt {
    /// Build a receipt for `order`, issued to `user_id`.
    #[must_use]
    pub fn for_order(order: &Order, user_id: UserId) -> Self {
        Self {
            id: ReceiptId::generate(),
            user_id,
            order_id: order.id,
            total_amount: order.total_amount,
            currency: order.currency.clone(),
            items: order.items.clone(),
            created_at: Utc::now(),
        }
    }
}

/// Outcome of issuing a receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedReceipt {
    /// The receipt for the order.
    pub receipt: Receipt,
    /// `true` if the receipt already existed and nothing was written.
    pub already_processed: bool,
}
