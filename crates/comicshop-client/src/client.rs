//! Comicshop HTTP client implementation.

use reqwest::{Client, RequestBuilder};
use std::time::Duration;

use comicshop_core::{CartItem, Comic, ComicId, OrderId, UserId, WishlistItem};

use crate::error::ClientError;
use crate::types::{
    AddToCartRequest, ApiErrorResponse, CartEnvelope, CartLine, HealthResponse, OrderPage,
    OrderWithReceipt, PaymentSuccessResponse, PlaceOrderRequest, PlaceOrderResponse,
    ReceiptEnvelope, UpdateStockRequest,
};

/// Comicshop API client.
///
/// Provides methods for checkout, receipts, stock, catalogue and cart.
#[derive(Debug, Clone)]
pub struct ComicshopClient {
    client: Client,
    base_url: String,
}

impl ComicshopClient {
    /// Create a new comicshop client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the comicshop service (e.g., `"http://comicshop:8080"`)
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_options(base_url, ClientOptions::default())
    }

    /// Create a new comicshop client with custom options.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is empty or the HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::Configuration("base URL must not be empty".into()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .user_agent(options.user_agent)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Check service health.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        self.send(self.client.get(format!("{}/health", self.base_url)))
            .await
    }

    /// Check out a wishlist.
    ///
    /// The server prices the items itself and returns the payment client secret.
    ///
    /// # Errors
    ///
    /// Returns `OutOfStock` if a comic cannot cover its quantity, `NotFound` if
    /// the buyer has no profile, or another error if the request fails.
    pub async fn place_order(
        &self,
        user_id: UserId,
        wishlist_items: Vec<WishlistItem>,
    ) -> Result<PlaceOrderResponse, ClientError> {
        let request = PlaceOrderRequest {
            user_id,
            wishlist_items,
        };

        tracing::debug!(
            user_id = %user_id,
            items = request.wishlist_items.len(),
            "Placing order"
        );

        self.send(self.api_post("orders").json(&request)).await
    }

    /// List a buyer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_orders(
        &self,
        user_id: UserId,
        limit: usize,
        offset: usize,
    ) -> Result<OrderPage, ClientError> {
        let query = [
            ("userId", user_id.to_string()),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ];
        self.send(self.api_get("orders").query(&query)).await
    }

    /// Confirm a payment, issuing the order's receipt.
    ///
    /// Safe to call more than once; later calls report `already_processed`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown order, or an API error if the user
    /// did not place it.
    pub async fn payment_success(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<PaymentSuccessResponse, ClientError> {
        let query = [
            ("orderId", order_id.to_string()),
            ("userId", user_id.to_string()),
        ];
        self.send(self.api_get("payment-success").query(&query))
            .await
    }

    /// Fetch an order and its receipt.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown order.
    pub async fn get_receipt(&self, order_id: OrderId) -> Result<OrderWithReceipt, ClientError> {
        let envelope: ReceiptEnvelope = self
            .send(
                self.api_get("receipt")
                    .query(&[("orderId", order_id.to_string())]),
            )
            .await?;
        Ok(envelope.order)
    }

    /// Overwrite a comic's total stock.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown comic, or an API error for a negative stock.
    pub async fn update_stock(
        &self,
        comic_id: ComicId,
        new_stock: i64,
    ) -> Result<Comic, ClientError> {
        let request = UpdateStockRequest {
            comic_id,
            new_stock,
        };
        let rows: Vec<Comic> = self.send(self.api_post("stock").json(&request)).await?;
        rows.into_iter().next().ok_or_else(|| ClientError::Api {
            code: "internal_error".into(),
            message: format!("stock update for {comic_id} returned no rows"),
            status: 500,
        })
    }

    /// List comics for sale.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_comics(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Comic>, ClientError> {
        let query = [("limit", limit.to_string()), ("offset", offset.to_string())];
        self.send(self.api_get("comics").query(&query)).await
    }

    /// Fetch one comic.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown comic.
    pub async fn get_comic(&self, comic_id: ComicId) -> Result<Comic, ClientError> {
        self.send(self.api_get(&format!("comics/{comic_id}"))).await
    }

    /// List a user's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn get_cart(&self, user_id: UserId) -> Result<Vec<CartLine>, ClientError> {
        let envelope: CartEnvelope = self
            .send(
                self.api_get("cart")
                    .query(&[("userId", user_id.to_string())]),
            )
            .await?;
        Ok(envelope.items)
    }

    /// Add a comic to a user's cart. Returns the resulting row.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown comic.
    pub async fn add_to_cart(
        &self,
        user_id: UserId,
        comic_id: ComicId,
        quantity: i64,
    ) -> Result<CartItem, ClientError> {
        let request = AddToCartRequest {
            user_id,
            comic_id,
            quantity,
        };
        self.send(self.api_post("cart").json(&request)).await
    }

    fn api_get(&self, path: &str) -> RequestBuilder {
        self.client.get(format!("{}/api/{path}", self.base_url))
    }

    fn api_post(&self, path: &str) -> RequestBuilder {
        self.client.post(format!("{}/api/{path}", self.base_url))
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            let body = response.bytes().await?;
            return Ok(serde_json::from_slice(&body)?);
        }

        let error_body: Result<ApiErrorResponse, _> = response.json().await;

        match error_body {
            Ok(api_error) => match api_error.code.as_str() {
                "out_of_stock" => Err(ClientError::OutOfStock {
                    message: api_error.error,
                }),
                "not_found" => Err(ClientError::NotFound {
                    message: api_error.error,
                }),
                _ => Err(ClientError::Api {
                    code: api_error.code,
                    message: api_error.error,
                    status: status.as_u16(),
                }),
            },
            Err(_) => Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            }),
        }
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: concat!("comicshop-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientOptions {
    /// Create options with a request timeout.
    #[must_use]
    pub fn with_timeout(timeout_seconds: u64) -> Self {
        Self {
            timeout_seconds,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let client = ComicshopClient::new("http://localhost:8080").unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = ComicshopClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn client_rejects_empty_base_url() {
        let err = ComicshopClient::new("/").unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
    }

    #[test]
    fn client_options() {
        let options = ClientOptions::with_timeout(5);
        assert_eq!(options.timeout_seconds, 5);
        assert!(options.user_agent.starts_with("comicshop-client/"));
    }
}
