//! Money conversion.
//!
//! Prices enter the system in major units (e.g. `9.99` dollars) and are
//! carried as `i64` minor units (cents) everywhere after that. Unit prices
//! and order totals are each converted once, by [`to_minor_units`].
//!
//! Rounding is half-away-from-zero. Totals are rounded once, from the exact
//! major-unit sum, so `total == round(Σ price * qty * 100)` holds for any
//! positive price, including sub-cent ones.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{Result, ShopError};

/// Convert a major-unit amount to minor units, rounding half away from zero.
///
/// # Errors
///
/// Returns `ShopError::Validation` if the amount does not fit in an `i64`
/// once scaled.
pub fn to_minor_units(major: Decimal) -> Result<i64> {
    round_to_minor_units(major)
        .ok_or_else(|| ShopError::validation(format!("amount {major} is out of range")))
}

/// Scale a major-unit amount by 100 and round half away from zero.
///
/// Returns `None` if the result does not fit in an `i64`.
#[must_use]
pub fn round_to_minor_units(major: Decimal) -> Option<i64> {
    major
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Validate and normalize an ISO-4217 currency code to lower case.
///
/// # Errors
///
/// Returns `ShopError::Validation` unless the code is exactly three ASCII letters.
pub fn normalize_currency(code: &str) -> Result<String> {
    let code = code.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_lowercase())
    } else {
        Err(ShopError::validation(format!(
            "invalid currency code: {code:?}"
        )))
    }
}
