//! Stripe webhook handler.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use serde::Serialize;

use comicshop_core::{OrderId, UserId};

use super::required;
use crate::checkout;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;
use crate::stripe::{PaymentIntent, WebhookEvent};

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the webhook was accepted.
    pub received: bool,
}

/// Handle Stripe webhooks.
///
/// `POST /webhooks/stripe`
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<ApiJson<WebhookResponse>, ApiError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok());

    match state.stripe.as_ref().filter(|s| s.has_webhook_secret()) {
        Some(stripe) => {
            let sig = signature
                .ok_or_else(|| ApiError::BadRequest("Missing Stripe signature".into()))?;
            stripe.verify_webhook_signature(&body, sig).map_err(|e| {
                tracing::warn!(error = %e, "Invalid Stripe webhook signature");
                ApiError::BadRequest("Invalid webhook signature".into())
            })?;
        }
        None => {
            tracing::warn!(
                "Stripe webhook secret not configured - skipping signature verification"
            );
        }
    }

    let event: WebhookEvent =
        serde_json::from_str(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tracing::info!(
        event_type = %event.event_type,
        event_id = %event.id,
        "Received Stripe webhook"
    );

    match event.event_type.as_str() {
        "payment_intent.succeeded" => {
            handle_payment_succeeded(&state, &event).await?;
        }
        "payment_intent.payment_failed" | "payment_intent.canceled" => {
            tracing::info!(
                event_type = %event.event_type,
                payment_intent_id = ?event.data.object.get("id"),
                "Payment did not complete"
            );
        }
        _ => {
            tracing::debug!(event_type = %event.event_type, "Unhandled Stripe event");
        }
    }

    Ok(ApiJson(WebhookResponse { received: true }))
}

async fn handle_payment_succeeded(state: &AppState, event: &WebhookEvent) -> Result<(), ApiError> {
    let intent: PaymentIntent = serde_json::from_value(event.data.object.clone())
        .map_err(|e| ApiError::BadRequest(format!("malformed payment intent: {e}")))?;

    let (Some(order_id), Some(user_id)) = (
        intent.metadata.order_id.as_deref(),
        intent.metadata.user_id.as_deref(),
    ) else {
        tracing::warn!(
            payment_intent_id = %intent.id,
            "Payment intent has no order metadata - ignoring"
        );
        return Ok(());
    };

    let order_id: OrderId = required(Some(order_id), "metadata.order_id")?;
    let user_id: UserId = required(Some(user_id), "metadata.user_id")?;

    let confirmation =
        checkout::handle_payment_success(state.store.as_ref(), order_id, user_id).await?;
    tracing::info!(
        payment_intent_id = %intent.id,
        order_id = %order_id,
        receipt_id = %confirmation.receipt_id,
        already_processed = confirmation.already_processed,
        "Payment confirmed by webhook"
    );

    Ok(())
}
