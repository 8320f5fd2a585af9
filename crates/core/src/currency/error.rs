//! Currency error types.

use thiserror::Error;
use travelfx_shared::{AppError, CurrencyCode};

/// Currency and exchange-rate errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CurrencyError {
    /// Provider or network failure with no cached table to fall back on.
    #[error("Exchange rates for {base} unavailable: {reason}")]
    RateSourceUnavailable {
        /// Base currency that was requested.
        base: CurrencyCode,
        /// Provider failure description.
        reason: String,
    },

    /// Currency code not recognized by configuration or the provider.
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(CurrencyCode),

    /// Pair missing from otherwise valid rate tables.
    #[error("No exchange rate available from {from} to {to}")]
    RateUnavailable {
        /// Source currency.
        from: CurrencyCode,
        /// Target currency.
        to: CurrencyCode,
    },

    /// Negative or non-finite amount.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Provider data failed validation.
    #[error("Invalid rate table: {0}")]
    InvalidRateTable(String),
}

impl From<CurrencyError> for AppError {
    fn from(err: CurrencyError) -> Self {
        let message = err.to_string();
        match err {
            CurrencyError::RateSourceUnavailable { .. } => Self::RatesUnavailable(message),
            CurrencyError::UnsupportedCurrency(code) => Self::UnsupportedCurrency(code.to_string()),
            CurrencyError::RateUnavailable { .. } => Self::Conversion(message),
            CurrencyError::InvalidAmount(_) => Self::Validation(message),
            CurrencyError::InvalidRateTable(_) => Self::RatesUnavailable(message),
        }
    }
}
