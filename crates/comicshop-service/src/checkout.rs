//! The order and receipt workflows.
//!
//! `place_order` prices the wishlist, opens a payment intent, then stores the
//! order and its stock decrements in one store operation. If that operation
//! fails the intent is cancelled. `handle_payment_success` turns a paid order
//! into exactly one receipt and clears the buyer's cart.

use std::sync::Arc;

use comicshop_core::{
    CheckoutSummary, NewOrder, OrderId, Receipt, ReceiptId, Result, ShopError, UserId,
    WishlistItem,
};
use comicshop_store::Store;

use crate::gateway::{PaymentGateway, PaymentIntentRequest};

/// Result of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    /// Secret the storefront uses to confirm the payment.
    pub client_secret: String,
    /// The stored order.
    pub order_id: OrderId,
}

/// Result of a payment confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    /// The order's receipt.
    pub receipt_id: ReceiptId,
    /// `true` if the receipt had already been issued.
    pub already_processed: bool,
}

/// Price a wishlist, open a payment intent and store the order.
///
/// # Errors
///
/// - `Validation` for an empty or malformed wishlist, before any I/O.
/// - `NotFound` if the buyer has no profile or a comic does not exist.
/// - `Gateway` if the payment intent cannot be created.
/// - `OutOfStock` if a comic cannot cover its quantity; nothing is stored.
/// - `Persistence` if the store fails.
pub async fn place_order(
    store: &dyn Store,
    gateway: &dyn PaymentGateway,
    user_id: UserId,
    wishlist_items: &[WishlistItem],
) -> Result<PlacedOrder> {
    let summary = CheckoutSummary::from_wishlist(wishlist_items)?;

    let order_id = OrderId::generate();
    let mut order = create_order(store, order_id, user_id, &summary).await?;

    let intent = gateway
        .create_payment_intent(&PaymentIntentRequest {
            amount: summary.total_amount,
            currency: summary.currency.clone(),
            order_id,
            user_id,
        })
        .await?;
    order.payment_intent_id = Some(intent.id.clone());

    let stored = store
        .place_order(order, &summary.stock_decrements())
        .await
        .map_err(ShopError::from);

    match stored {
        Ok(order) => {
            tracing::info!(
                order_id = %order.id,
                user_id = %user_id,
                total_amount = order.total_amount,
                currency = %order.currency,
                items = order.items.len(),
                "Order placed"
            );
            Ok(PlacedOrder {
                client_secret: intent.client_secret,
                order_id: order.id,
            })
        }
        Err(err) => {
            if let Err(cancel_err) = gateway.cancel_payment_intent(&intent.id).await {
                tracing::error!(
                    order_id = %order_id,
                    payment_intent_id = %intent.id,
                    error = %cancel_err,
                    "Failed to cancel payment intent for unstored order"
                );
            } else {
                tracing::info!(
                    order_id = %order_id,
                    payment_intent_id = %intent.id,
                    "Cancelled payment intent for unstored order"
                );
            }
            Err(err)
        }
    }
}

/// Run [`place_order`] on its own task and wait for it.
///
/// Dropping the returned future, as a request timeout does, leaves the task
/// running, so an opened intent is still either stored or cancelled.
///
/// # Errors
///
/// Same as [`place_order`]; a panicked task is a `Persistence` error.
pub async fn place_order_detached(
    store: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
    user_id: UserId,
    wishlist_items: Vec<WishlistItem>,
) -> Result<PlacedOrder> {
    tokio::spawn(async move {
        place_order(store.as_ref(), gateway.as_ref(), user_id, &wishlist_items).await
    })
    .await
    .map_err(|e| ShopError::Persistence(format!("checkout task failed: {e}")))?
}

/// Build the order row for a priced wishlist, stamped with the buyer's name.
///
/// Prices are already in minor units; nothing is rescaled here. The payment
/// intent ID is filled in once the intent exists.
///
/// # Errors
///
/// Returns `NotFound` if the buyer has no profile.
pub async fn create_order(
    store: &dyn Store,
    order_id: OrderId,
    user_id: UserId,
    summary: &CheckoutSummary,
) -> Result<NewOrder> {
    let profile = store
        .get_profile(&user_id)
        .await?
        .ok_or_else(|| ShopError::not_found("profile", user_id))?;

    Ok(NewOrder {
        id: order_id,
        user_id,
        user_name: profile.username,
        total_amount: summary.total_amount,
        currency: summary.currency.clone(),
        items: summary.order_items(),
        payment_intent_id: None,
    })
}

/// Issue the receipt for a paid order and clear the buyer's cart.
///
/// Calling this again for the same order returns the same receipt.
///
/// # Errors
///
/// - `NotFound` if the order does not exist.
/// - `Validation` if `user_id` did not place the order.
/// - `Persistence` if the store fails.
pub async fn handle_payment_success(
    store: &dyn Store,
    order_id: OrderId,
    user_id: UserId,
) -> Result<PaymentConfirmation> {
    let order = store
        .get_order(&order_id)
        .await?
        .ok_or_else(|| ShopError::not_found("order", order_id))?;

    if order.user_id != user_id {
        return Err(ShopError::validation(format!(
            "order {order_id} does not belong to user {user_id}"
        )));
    }

    let issued = store
        .issue_receipt(Receipt::for_order(&order, user_id))
        .await?;

    if issued.already_processed {
        tracing::debug!(
            order_id = %order_id,
            receipt_id = %issued.receipt.id,
            "Receipt already issued"
        );
    } else {
        tracing::info!(
            order_id = %order_id,
            receipt_id = %issued.receipt.id,
            total_amount = issued.receipt.total_amount,
            "Receipt issued"
        );
    }

    Ok(PaymentConfirmation {
        receipt_id: issued.receipt.id,
        already_processed: issued.already_processed,
    })
}
