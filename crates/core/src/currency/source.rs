//! Rate source adapter boundary.
//!
//! A `RateSource` performs exactly one outbound request per call and never
//! retries. Retry and fallback policy belongs to `RateCache`.

use thiserror::Error;
use travelfx_shared::CurrencyCode;

use super::exchange::ExchangeRateTable;

/// Failures reported by a rate provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateSourceError {
    /// Network, timeout, provider-side or response-format failure. Transient.
    #[error("Rate source unavailable: {0}")]
    Unavailable(String),

    /// The provider does not recognize the requested base currency. Permanent.
    #[error("Rate source does not support {0}")]
    UnsupportedCurrency(CurrencyCode),
}

/// A provider of exchange rate tables.
///
/// Implementations must validate provider data into an `ExchangeRateTable`
/// before returning it.
pub trait RateSource: Send + Sync {
    /// Fetches the current table of rates for `base`.
    ///
    /// # Errors
    ///
    /// Returns `RateSourceError::Unavailable` on transient failures and
    /// `RateSourceError::UnsupportedCurrency` if `base` is unknown to the
    /// provider.
    fn fetch_rates(&self, base: CurrencyCode) -> Result<ExchangeRateTable, RateSourceError>;
}

impl<T: RateSource + ?Sized> RateSource for std::sync::Arc<T> {
    fn fetch_rates(&self, base: CurrencyCode) -> Result<ExchangeRateTable, RateSourceError> {
        (**self).fetch_rates(base)
    }
}
