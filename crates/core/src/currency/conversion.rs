//! Currency conversion arithmetic.
//!
//! CRITICAL: Rounding strategy for multi-currency:
//! - Converted amounts are rounded to 2 decimal places
//! - Use banker's rounding (round half to even)
//! - Amounts are validated before any arithmetic

use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;
use rust_decimal::prelude::FromPrimitive;

use super::error::CurrencyError;

/// Decimal places of every converted amount.
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// Converts an amount using the given exchange rate.
///
/// Uses banker's rounding (round half to even) to minimize cumulative errors.
///
/// # Errors
///
/// Returns `CurrencyError::InvalidAmount` if the product does not fit a
/// `Decimal`.
pub fn convert_amount(
    amount: Decimal,
    rate: Decimal,
    decimal_places: u32,
) -> Result<Decimal, CurrencyError> {
    let converted = amount.checked_mul(rate).ok_or_else(|| {
        CurrencyError::InvalidAmount(format!("{amount} at rate {rate} is out of range"))
    })?;
    Ok(converted.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven))
}

/// Sums amounts without overflowing.
///
/// # Errors
///
/// Returns `CurrencyError::InvalidAmount` if the sum does not fit a `Decimal`.
pub fn checked_total(
    amounts: impl IntoIterator<Item = Decimal>,
) -> Result<Decimal, CurrencyError> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, Decimal::checked_add)
        .ok_or_else(|| CurrencyError::InvalidAmount("total is out of range".to_string()))
}

/// Rounds a money amount to [`MONEY_DECIMAL_PLACES`] using banker's rounding.
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DECIMAL_PLACES, RoundingStrategy::MidpointNearestEven)
}

/// Rejects negative amounts. Negative zero comes back as plain zero.
///
/// # Errors
///
/// Returns `CurrencyError::InvalidAmount` if `amount` is below zero.
pub fn validate_amount(amount: Decimal) -> Result<Decimal, CurrencyError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(CurrencyError::InvalidAmount(format!("{amount} is negative")));
    }
    Ok(amount.abs())
}

/// Converts a floating-point amount from an outer layer into a `Decimal`.
///
/// # Errors
///
/// Returns `CurrencyError::InvalidAmount` for NaN, infinities, values that
/// do not fit a `Decimal`, and negative values.
pub fn amount_from_f64(value: f64) -> Result<Decimal, CurrencyError> {
    if !value.is_finite() {
        return Err(CurrencyError::InvalidAmount(format!("{value} is not finite")));
    }
    let amount = Decimal::from_f64(value)
        .ok_or_else(|| CurrencyError::InvalidAmount(format!("{value} is out of range")))?;
    validate_amount(amount)
}
