//! Error types for the comicshop domain.

use crate::ids::{ComicId, IdError};

/// Result type for comicshop operations.
pub type Result<T> = std::result::Result<T, ShopError>;

/// Errors raised by the checkout and receipt workflows.
#[derive(Debug, thiserror::Error)]
pub enum ShopError {
    /// Missing or malformed input.
    #[error("validation error: {0}")]
    Validation(String),

    /// A profile, comic, order or receipt does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity that was looked up.
        entity: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// A conditional stock decrement matched no row.
    #[error("out of stock: comic {comic_id} has {available} left, {requested} requested")]
    OutOfStock {
        /// The comic that could not cover the request.
        comic_id: ComicId,
        /// Units requested by the order.
        requested: i64,
        /// Units available when the decrement was attempted.
        available: i64,
    },

    /// The payment provider failed or rejected the request.
    #[error("payment gateway error: {0}")]
    Gateway(String),

    /// The store failed, or an expected row was not returned.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl ShopError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for a missing entity.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<IdError> for ShopError {
    fn from(err: IdError) -> Self {
        Self::Validation(err.to_string())
    }
}
