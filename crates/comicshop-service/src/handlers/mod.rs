//! HTTP request handlers.

pub mod cart;
pub mod catalog;
pub mod health;
pub mod orders;
pub mod receipts;
pub mod stock;
pub mod webhooks;

use std::fmt::Display;
use std::str::FromStr;

use crate::error::ApiError;

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: usize = 100;

/// Parse a required request field, naming it in the error.
pub(crate) fn required<T>(value: Option<&str>, name: &str) -> Result<T, ApiError>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{name} is required")))?;
    raw.parse()
        .map_err(|e| ApiError::BadRequest(format!("invalid {name}: {e}")))
}

/// Clamp a requested page size.
pub(crate) fn page_size(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}
