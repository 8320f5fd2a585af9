//! Exchange rate types and logic.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use travelfx_shared::CurrencyCode;

use super::error::CurrencyError;

/// Conversion factors from one base currency to others, as of a fetch time.
///
/// `1 base = rates[code] code`. Every factor is strictly positive and the
/// self-rate of the base, when present, is exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRateTable")]
pub struct ExchangeRateTable {
    base_currency: CurrencyCode,
    rates: BTreeMap<CurrencyCode, Decimal>,
    fetched_at: DateTime<Utc>,
}

/// Unvalidated wire form used for deserialization.
#[derive(Deserialize)]
struct RawRateTable {
    base_currency: CurrencyCode,
    rates: BTreeMap<CurrencyCode, Decimal>,
    fetched_at: DateTime<Utc>,
}

impl TryFrom<RawRateTable> for ExchangeRateTable {
    type Error = CurrencyError;

    fn try_from(raw: RawRateTable) -> Result<Self, Self::Error> {
        Self::new(raw.base_currency, raw.rates, raw.fetched_at)
    }
}

impl ExchangeRateTable {
    /// Creates a validated rate table.
    ///
    /// # Errors
    ///
    /// Returns `CurrencyError::InvalidRateTable` if any factor is zero or
    /// negative, or if the base currency's own factor is not one.
    pub fn new(
        base_currency: CurrencyCode,
        rates: impl IntoIterator<Item = (CurrencyCode, Decimal)>,
        fetched_at: DateTime<Utc>,
    ) -> Result<Self, CurrencyError> {
        let rates: BTreeMap<CurrencyCode, Decimal> = rates.into_iter().collect();

        if let Some((code, rate)) = rates.iter().find(|(_, rate)| **rate <= Decimal::ZERO) {
            return Err(CurrencyError::InvalidRateTable(format!(
                "rate for {code} must be positive, got {rate}"
            )));
        }

        if let Some(self_rate) = rates.get(&base_currency) {
            if *self_rate != Decimal::ONE {
                return Err(CurrencyError::InvalidRateTable(format!(
                    "rate for base {base_currency} must be 1, got {self_rate}"
                )));
            }
        }

        Ok(Self {
            base_currency,
            rates,
            fetched_at,
        })
    }

    /// Base currency of this table.
    #[must_use]
    pub const fn base_currency(&self) -> CurrencyCode {
        self.base_currency
    }

    /// When the provider produced these rates.
    #[must_use]
    pub const fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Factor converting one unit of the base into `currency`.
    ///
    /// The base currency always resolves to one even if the provider
    /// omitted it.
    #[must_use]
    pub fn rate(&self, currency: CurrencyCode) -> Option<Decimal> {
        if currency == self.base_currency {
            return Some(Decimal::ONE);
        }
        self.rates.get(&currency).copied()
    }

    /// All quoted factors, ordered by currency code.
    pub fn rates(&self) -> impl Iterator<Item = (CurrencyCode, Decimal)> + '_ {
        self.rates.iter().map(|(code, rate)| (*code, *rate))
    }

    /// Number of quoted currencies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Returns true if the provider quoted nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
