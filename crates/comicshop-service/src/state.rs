//! Application state.

use std::sync::Arc;

use comicshop_store::Store;

use crate::config::ServiceConfig;
use crate::gateway::PaymentGateway;
use crate::stripe::StripeClient;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Payment gateway used by checkout (optional).
    pub gateway: Option<Arc<dyn PaymentGateway>>,

    /// Stripe client, kept for webhook verification (optional).
    pub stripe: Option<Arc<StripeClient>>,
}

impl AppState {
    /// Create a new application state, building the Stripe client from config.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        let stripe = config.stripe_api_key.as_ref().and_then(|key| {
            match StripeClient::new(key, config.stripe_webhook_secret.clone()) {
                Ok(client) => {
                    tracing::info!("Stripe integration enabled");
                    Some(Arc::new(client))
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create Stripe client");
                    None
                }
            }
        });

        if stripe.is_none() {
            tracing::warn!("Stripe not configured - checkout will not be available");
        }

        let gateway = stripe
            .clone()
            .map(|client| client as Arc<dyn PaymentGateway>);

        Self {
            store,
            config,
            gateway,
            stripe,
        }
    }

    /// Replace the payment gateway.
    #[must_use]
    pub fn with_gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }
}
