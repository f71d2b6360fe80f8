//! Request and response types for the comicshop client.

use serde::{Deserialize, Serialize};

use comicshop_core::{
    CartItem, Comic, ComicId, Order, OrderId, Receipt, ReceiptId, UserId, WishlistItem,
};

/// Checkout request. The server computes the amount itself.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    /// Buyer.
    pub user_id: UserId,
    /// Items to buy.
    pub wishlist_items: Vec<WishlistItem>,
}

/// Checkout response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderResponse {
    /// Secret used to confirm the payment in the browser.
    pub client_secret: String,
    /// The stored order.
    pub order_id: OrderId,
}

/// One page of a buyer's order history.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    /// Orders, newest first.
    pub orders: Vec<Order>,
    /// Whether another page exists.
    pub has_more: bool,
}

/// Payment confirmation response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSuccessResponse {
    /// Human-readable outcome.
    pub message: String,
    /// The order's receipt.
    pub receipt_id: ReceiptId,
    /// Whether the receipt had already been issued.
    pub already_processed: bool,
}

/// An order together with its receipt, if one has been issued.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderWithReceipt {
    /// The order.
    #[serde(flatten)]
    pub order: Order,
    /// Its receipt.
    #[serde(default)]
    pub receipt: Option<Receipt>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReceiptEnvelope {
    pub order: OrderWithReceipt,
}

/// Stock overwrite request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStockRequest {
    /// Comic to update.
    pub comic_id: ComicId,
    /// The comic's new total stock.
    pub new_stock: i64,
}

/// A cart row with the comic it refers to.
#[derive(Debug, Clone, Deserialize)]
pub struct CartLine {
    /// The cart row.
    #[serde(flatten)]
    pub item: CartItem,
    /// The comic, unless it has been delisted.
    #[serde(default)]
    pub comic: Option<Comic>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CartEnvelope {
    pub items: Vec<CartLine>,
}

/// Add-to-cart request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    /// Cart owner.
    pub user_id: UserId,
    /// Comic to add.
    pub comic_id: ComicId,
    /// Units to add.
    pub quantity: i64,
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: String,
    pub code: String,
}

/// Health check response.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
}
