//! Stripe API client implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use comicshop_core::ShopError;

use super::types::{PaymentIntent, StripeErrorResponse};
use crate::crypto::verify_hmac_sha256_hex;
use crate::gateway::{CreatedIntent, PaymentGateway, PaymentIntentRequest};

/// Error type for Stripe operations.
#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe API returned an error.
    #[error("Stripe API error: {error_type} - {message}")]
    Api {
        /// Error type.
        error_type: String,
        /// Error message.
        message: String,
        /// Error code.
        code: Option<String>,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid webhook signature.
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// Webhook timestamp outside the tolerance window.
    #[error("Webhook timestamp outside tolerance")]
    StaleTimestamp,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<StripeError> for ShopError {
    fn from(err: StripeError) -> Self {
        Self::Gateway(err.to_string())
    }
}

/// Stripe API client.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    base_url: String,
    api_key: String,
    webhook_secret: Option<String>,
}

impl StripeClient {
    /// Stripe API base URL.
    pub const BASE_URL: &'static str = "https://api.stripe.com/v1";

    /// Seconds a signed webhook stays valid.
    pub const WEBHOOK_TOLERANCE_SECONDS: i64 = 300;

    /// Create a new Stripe client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Stripe secret API key (`sk_test_...` or `sk_live_...`)
    /// * `webhook_secret` - Optional webhook signing secret (`whsec_...`)
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        api_key: impl Into<String>,
        webhook_secret: Option<String>,
    ) -> Result<Self, StripeError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            base_url: Self::BASE_URL.to_string(),
            api_key: api_key.into(),
            webhook_secret,
        })
    }

    /// Point the client at another API root (a mock server in tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether webhook signatures can be verified.
    #[must_use]
    pub fn has_webhook_secret(&self) -> bool {
        self.webhook_secret.is_some()
    }

    /// Create a payment intent with automatic payment methods enabled.
    ///
    /// The order ID doubles as the idempotency key, so a retried checkout
    /// never opens a second intent for the same order.
    pub async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, StripeError> {
        let order_id = request.order_id.to_string();
        let params = [
            ("amount", request.amount.to_string()),
            ("currency", request.currency.clone()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
            ("metadata[order_id]", order_id.clone()),
            ("metadata[user_id]", request.user_id.to_string()),
        ];

        tracing::debug!(
            order_id = %order_id,
            amount = request.amount,
            currency = %request.currency,
            "Creating Stripe payment intent"
        );

        let response = self
            .client
            .post(format!("{}/payment_intents", self.base_url))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .header("Idempotency-Key", &order_id)
            .form(&params)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Cancel a payment intent.
    pub async fn cancel_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<PaymentIntent, StripeError> {
        let response = self
            .client
            .post(format!(
                "{}/payment_intents/{}/cancel",
                self.base_url, payment_intent_id
            ))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Verify a webhook signature against the current time.
    ///
    /// # Arguments
    ///
    /// * `payload` - Raw request body
    /// * `signature` - Value of the `Stripe-Signature` header
    pub fn verify_webhook_signature(
        &self,
        payload: &str,
        signature: &str,
    ) -> Result<(), StripeError> {
        self.verify_webhook_signature_at(payload, signature, chrono::Utc::now().timestamp())
    }

    /// Verify a webhook signature as of `now` (Unix seconds).
    pub fn verify_webhook_signature_at(
        &self,
        payload: &str,
        signature: &str,
        now: i64,
    ) -> Result<(), StripeError> {
        let secret = self
            .webhook_secret
            .as_ref()
            .ok_or_else(|| StripeError::Configuration("Webhook secret not configured".into()))?;

        // Format: t=timestamp,v1=signature,v1=signature2,...
        let mut timestamp: Option<&str> = None;
        let mut signatures: Vec<&str> = Vec::new();

        for part in signature.split(',') {
            match part.trim().split_once('=') {
                Some(("t", ts)) => timestamp = Some(ts),
                Some(("v1", sig)) => signatures.push(sig),
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(StripeError::InvalidSignature)?;
        if signatures.is_empty() {
            return Err(StripeError::InvalidSignature);
        }

        let signed_at: i64 = timestamp
            .parse()
            .map_err(|_| StripeError::InvalidSignature)?;
        if now.abs_diff(signed_at) > Self::WEBHOOK_TOLERANCE_SECONDS.unsigned_abs() {
            return Err(StripeError::StaleTimestamp);
        }

        let signed_payload = format!("{timestamp}.{payload}");
        let valid = signatures.iter().any(|sig| {
            verify_hmac_sha256_hex(secret.as_bytes(), signed_payload.as_bytes(), sig)
        });

        if valid {
            Ok(())
        } else {
            Err(StripeError::InvalidSignature)
        }
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, StripeError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let error_body: Result<StripeErrorResponse, _> = response.json().await;

        match error_body {
            Ok(stripe_error) => Err(StripeError::Api {
                error_type: stripe_error.error.error_type,
                message: stripe_error.error.message,
                code: stripe_error.error.code,
            }),
            Err(_) => Err(StripeError::Api {
                error_type: "unknown".to_string(),
                message: format!("HTTP {status}"),
                code: None,
            }),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<CreatedIntent, ShopError> {
        let intent = StripeClient::create_payment_intent(self, request).await?;
        let client_secret = intent.client_secret.ok_or_else(|| {
            ShopError::Gateway(format!("payment intent {} has no client secret", intent.id))
        })?;
        Ok(CreatedIntent {
            id: intent.id,
            client_secret,
        })
    }

    async fn cancel_payment_intent(&self, intent_id: &str) -> Result<(), ShopError> {
        StripeClient::cancel_payment_intent(self, intent_id).await?;
        Ok(())
    }
}
