//! Checkout and order history handlers.

use std::sync::Arc;

use axum::extract::State;
use serde::{Deserialize, Serialize};

use comicshop_core::{Order, ShopError, UserId, WishlistItem};

use super::{page_size, required};
use crate::checkout;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

/// Checkout request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Amount the storefront computed. Ignored; the server recomputes it.
    #[serde(default)]
    pub amount: Option<serde_json::Value>,
    /// Buyer.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Items to buy.
    #[serde(default)]
    pub wishlist_items: Vec<WishlistItem>,
}

/// Checkout response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    /// Secret the storefront uses to confirm the payment.
    pub client_secret: String,
    /// The stored order.
    pub order_id: String,
}

/// Place an order for a wishlist.
///
/// `POST /api/orders`
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<CreateOrderRequest>,
) -> Result<ApiJson<CreateOrderResponse>, ApiError> {
    let user_id: UserId = required(request.user_id.as_deref(), "userId")?;
    if request.amount.is_some() {
        tracing::debug!(user_id = %user_id, "Ignoring client-supplied amount");
    }

    let gateway = state
        .gateway
        .clone()
        .ok_or_else(|| ShopError::Gateway("payment gateway not configured".into()))?;

    let placed = checkout::place_order_detached(
        Arc::clone(&state.store),
        gateway,
        user_id,
        request.wishlist_items,
    )
    .await?;

    Ok(ApiJson(CreateOrderResponse {
        client_secret: placed.client_secret,
        order_id: placed.order_id.to_string(),
    }))
}

/// Order history query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOrdersQuery {
    /// Buyer.
    pub user_id: Option<String>,
    /// Page size.
    pub limit: Option<usize>,
    /// Rows to skip.
    pub offset: Option<usize>,
}

/// Order history response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOrdersResponse {
    /// Orders, newest first.
    pub orders: Vec<Order>,
    /// Whether another page exists.
    pub has_more: bool,
}

/// List a buyer's orders, newest first.
///
/// `GET /api/orders?userId=&limit=&offset=`
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ListOrdersQuery>,
) -> Result<ApiJson<ListOrdersResponse>, ApiError> {
    let user_id: UserId = required(query.user_id.as_deref(), "userId")?;
    let limit = page_size(query.limit);
    let offset = query.offset.unwrap_or(0);

    let mut orders = state
        .store
        .list_orders_by_user(&user_id, limit + 1, offset)
        .await?;

    let has_more = orders.len() > limit;
    orders.truncate(limit);

    Ok(ApiJson(ListOrdersResponse { orders, has_more }))
}
