//! Client error types.

/// Errors that can occur when using the comicshop client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error response.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// A comic could not cover the requested quantity.
    #[error("out of stock: {message}")]
    OutOfStock {
        /// Server message naming the comic.
        message: String,
    },

    /// A profile, comic or order does not exist.
    #[error("not found: {message}")]
    NotFound {
        /// Server message naming the entity.
        message: String,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// HTTP status of a server-side failure, if there was one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::OutOfStock { .. } => Some(409),
            Self::NotFound { .. } => Some(404),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            Self::Serialization(_) | Self::Configuration(_) => None,
        }
    }
}
