//! Error types for comicshop storage.

use comicshop_core::{ComicId, ShopError};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A row the operation depends on does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of row.
        entity: &'static str,
        /// Its key.
        id: String,
    },

    /// A conditional stock decrement matched no row.
    #[error("out of stock: comic {comic_id} has {available} left, {requested} requested")]
    OutOfStock {
        /// The comic that could not cover the request.
        comic_id: ComicId,
        /// Units requested.
        requested: i64,
        /// Units in stock at the time.
        available: i64,
    },

    /// A write would violate a table constraint.
    #[error("constraint violation: {0}")]
    Constraint(String),
}

impl StoreError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_check_violation() => {
                Self::Constraint(db.message().to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                Self::Serialization(err.to_string())
            }
            _ => Self::Database(err.to_string()),
        }
    }
}

impl From<StoreError> for ShopError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            StoreError::OutOfStock {
                comic_id,
                requested,
                available,
            } => Self::OutOfStock {
                comic_id,
                requested,
                available,
            },
            StoreError::Constraint(msg) => Self::Validation(msg),
            StoreError::Database(msg) | StoreError::Serialization(msg) => Self::Persistence(msg),
        }
    }
}
