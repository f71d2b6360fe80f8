//! Stripe API types.

use serde::Deserialize;

/// Stripe `PaymentIntent` object.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    /// Payment intent ID.
    pub id: String,
    /// Amount in minor units.
    #[serde(default)]
    pub amount: i64,
    /// Currency (e.g., "usd").
    #[serde(default)]
    pub currency: String,
    /// Status (`requires_payment_method`, succeeded, canceled, ...).
    #[serde(default)]
    pub status: String,
    /// Secret handed to the storefront to confirm the payment.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Metadata.
    #[serde(default)]
    pub metadata: PaymentMetadata,
}

/// Metadata the checkout attaches to every intent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentMetadata {
    /// Order the payment is for.
    #[serde(default)]
    pub order_id: Option<String>,
    /// Buyer.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Stripe webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    /// Event ID.
    pub id: String,
    /// Event type (e.g., `payment_intent.succeeded`).
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event data.
    pub data: WebhookEventData,
    /// Created timestamp (Unix).
    #[serde(default)]
    pub created: i64,
}

/// Webhook event data container.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    /// The event object.
    pub object: serde_json::Value,
}

/// Stripe API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorResponse {
    /// Error details.
    pub error: StripeErrorDetail,
}

/// Stripe error detail.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorDetail {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error message.
    #[serde(default)]
    pub message: String,
    /// Error code.
    #[serde(default)]
    pub code: Option<String>,
}
