//! The payment gateway seam used by the checkout workflow.

use async_trait::async_trait;

use comicshop_core::{OrderId, ShopError, UserId};

/// What the workflow asks the gateway to charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntentRequest {
    /// Amount in minor units.
    pub amount: i64,
    /// Lower-case currency code.
    pub currency: String,
    /// Order the payment is for, carried as metadata.
    pub order_id: OrderId,
    /// Buyer, carried as metadata.
    pub user_id: UserId,
}

/// A created payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIntent {
    /// Provider-side intent ID.
    pub id: String,
    /// Secret the storefront uses to confirm the payment.
    pub client_secret: String,
}

/// A payment processor that can open and cancel payment intents.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a payment intent with automatic payment-method selection.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Gateway` if the provider fails or rejects the request.
    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<CreatedIntent, ShopError>;

    /// Cancel an intent whose order could not be stored.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Gateway` if the provider fails.
    async fn cancel_payment_intent(&self, intent_id: &str) -> Result<(), ShopError>;
}
