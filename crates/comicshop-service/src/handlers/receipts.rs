//! Payment confirmation and receipt handlers.

use std::sync::Arc;

use axum::extract::State;
use serde::{Deserialize, Serialize};

use comicshop_core::{Order, OrderId, Receipt, ShopError, UserId};

use super::required;
use crate::checkout;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

/// Payment confirmation query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSuccessQuery {
    /// Paid order.
    pub order_id: Option<String>,
    /// Buyer.
    pub user_id: Option<String>,
}

/// Payment confirmation response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSuccessResponse {
    /// Human-readable outcome.
    pub message: &'static str,
    /// The order's receipt.
    pub receipt_id: String,
    /// Whether the receipt already existed.
    pub already_processed: bool,
}

/// Issue the receipt for a paid order.
///
/// `GET /api/payment-success?orderId=&userId=`
pub async fn payment_success(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<PaymentSuccessQuery>,
) -> Result<ApiJson<PaymentSuccessResponse>, ApiError> {
    let order_id: OrderId = required(query.order_id.as_deref(), "orderId")?;
    let user_id: UserId = required(query.user_id.as_deref(), "userId")?;

    let confirmation =
        checkout::handle_payment_success(state.store.as_ref(), order_id, user_id).await?;

    let message = if confirmation.already_processed {
        "Payment already processed"
    } else {
        "Payment successful"
    };

    Ok(ApiJson(PaymentSuccessResponse {
        message,
        receipt_id: confirmation.receipt_id.to_string(),
        already_processed: confirmation.already_processed,
    }))
}

/// Receipt query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptQuery {
    /// Order to look up.
    pub order_id: Option<String>,
}

/// An order together with its receipt, if one has been issued.
#[derive(Debug, Serialize)]
pub struct OrderWithReceipt {
    /// The order.
    #[serde(flatten)]
    pub order: Order,
    /// Its receipt.
    pub receipt: Option<Receipt>,
}

/// Receipt response.
#[derive(Debug, Serialize)]
pub struct ReceiptResponse {
    /// The order and its receipt.
    pub order: OrderWithReceipt,
}

/// Fetch an order and its receipt.
///
/// `GET /api/receipt?orderId=`
pub async fn get_receipt(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ReceiptQuery>,
) -> Result<ApiJson<ReceiptResponse>, ApiError> {
    let order_id: OrderId = required(query.order_id.as_deref(), "orderId")?;

    let order = state
        .store
        .get_order(&order_id)
        .await?
        .ok_or_else(|| ShopError::not_found("order", order_id))?;
    let receipt = state.store.get_receipt_by_order(&order_id).await?;

    Ok(ApiJson(ReceiptResponse {
        order: OrderWithReceipt { order, receipt },
    }))
}
