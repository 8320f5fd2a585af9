//! Application-wide error types.

use serde::Serialize;
use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// How a front end should present an error to the traveler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Show a non-blocking notice; the result is still usable.
    Warning,
    /// Stop the current action and show an error message.
    Blocking,
}

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input rejected before any computation (bad amount, category, code).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Currency not recognized by configuration or the rate provider.
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// Rate provider unreachable and nothing cached to fall back on.
    #[error("Exchange rates unavailable: {0}")]
    RatesUnavailable(String),

    /// A currency pair is missing from otherwise valid rate tables.
    #[error("Conversion failed: {0}")]
    Conversion(String),

    /// Referenced budget entry does not exist or conflicts.
    #[error("Budget error: {0}")]
    Budget(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns how this error should be surfaced to the traveler.
    ///
    /// Conversion gaps only affect part of a budget, so they are shown as
    /// warnings. Everything else stops the action.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Conversion(_) => Severity::Warning,
            Self::Validation(_)
            | Self::UnsupportedCurrency(_)
            | Self::RatesUnavailable(_)
            | Self::Budget(_)
            | Self::Config(_)
            | Self::Internal(_) => Severity::Blocking,
        }
    }

    /// Returns a stable machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::UnsupportedCurrency(_) => "UNSUPPORTED_CURRENCY",
            Self::RatesUnavailable(_) => "RATES_UNAVAILABLE",
            Self::Conversion(_) => "CONVERSION_FAILED",
            Self::Budget(_) => "BUDGET_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<crate::types::CurrencyCodeError> for AppError {
    fn from(err: crate::types::CurrencyCodeError) -> Self {
        Self::Validation(err.to_string())
    }
}
