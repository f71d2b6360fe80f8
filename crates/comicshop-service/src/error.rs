//! API error types and responses.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use comicshop_core::ShopError;
use comicshop_store::StoreError;

/// API error type. Every failure leaves the service through this.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad request: missing or malformed input.
    #[error("{0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Not enough stock to cover an order.
    #[error("{0}")]
    OutOfStock(String),

    /// The payment provider failed.
    #[error("{0}")]
    Gateway(String),

    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

/// JSON error response body: `{ "error": ..., "code": ... }`.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::OutOfStock(_) => StatusCode::CONFLICT,
            Self::Gateway(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::OutOfStock(_) => "out_of_stock",
            Self::Gateway(_) => "gateway_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Internal(msg) => tracing::error!(error = %msg, "Internal server error"),
            Self::Gateway(msg) => tracing::warn!(error = %msg, "Payment gateway error"),
            _ => tracing::debug!(error = %self, code = self.code(), "Request failed"),
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: self.code(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<ShopError> for ApiError {
    fn from(err: ShopError) -> Self {
        match err {
            ShopError::Validation(msg) => Self::BadRequest(msg),
            err @ ShopError::NotFound { .. } => Self::NotFound(err.to_string()),
            err @ ShopError::OutOfStock { .. } => Self::OutOfStock(err.to_string()),
            ShopError::Gateway(msg) => Self::Gateway(msg),
            ShopError::Persistence(msg) => Self::Internal(msg),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ShopError::from(err).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
