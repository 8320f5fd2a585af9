//! Multi-currency handling and exchange rates.

pub mod allocation;
pub mod cache;
pub mod clock;
pub mod conversion;
pub mod error;
pub mod exchange;
pub mod registry;
pub mod service;
pub mod source;

#[cfg(test)]
mod props;

#[cfg(test)]
pub(crate) mod testing;

pub use allocation::AllocationUtil;
pub use cache::{CachedRates, RateCache, RateCacheEntry};
pub use clock::{Clock, SystemClock};
pub use conversion::{
    MONEY_DECIMAL_PLACES, amount_from_f64, checked_total, convert_amount, round_money,
};
pub use error::CurrencyError;
pub use exchange::ExchangeRateTable;
pub use registry::{SupportedCurrencies, currency_name};
pub use service::{Conversion, CurrencyConverter, RateLookupMethod, ResolvedRate};
pub use source::{RateSource, RateSourceError};
