//! Currency service for conversion and exchange rate lookup.
//!
//! This module provides the main service interface for currency operations:
//! resolving a rate through the [`RateCache`] and converting amounts with
//! banker's rounding.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;
use travelfx_shared::{CurrencyCode, Money};

use super::cache::RateCache;
use super::conversion::{MONEY_DECIMAL_PLACES, convert_amount, validate_amount};
use super::error::CurrencyError;
use super::registry::SupportedCurrencies;

/// How an exchange rate was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLookupMethod {
    /// Source and target are the same currency.
    Identity,
    /// Quoted in the source currency's table.
    Direct,
    /// Quoted in the target currency's table, then inverted.
    Inverse,
}

/// A resolved exchange rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRate {
    /// 1 source = `rate` target.
    pub rate: Decimal,
    /// How the rate was obtained.
    pub method: RateLookupMethod,
    /// True if the table used was served past its freshness window.
    pub stale: bool,
    /// Fetch time of the table used. `None` for identity conversions.
    pub as_of: Option<DateTime<Utc>>,
}

/// Result of converting an amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conversion {
    /// Amount that was converted.
    pub source: Money,
    /// Converted amount, rounded to 2 decimal places.
    pub converted: Money,
    /// Rate that was applied.
    pub rate: Decimal,
    /// True if stale rates were used.
    pub stale: bool,
    /// Fetch time of the rates used. `None` for identity conversions.
    pub rates_as_of: Option<DateTime<Utc>>,
}

/// Currency service for conversion operations.
///
/// Reads rate tables through a shared [`RateCache`]; it never mutates cache
/// entries itself beyond triggering a lazy refresh.
pub struct CurrencyConverter {
    cache: Arc<RateCache>,
    supported: SupportedCurrencies,
}

impl CurrencyConverter {
    /// Creates a converter over `cache` accepting the `supported` codes.
    #[must_use]
    pub fn new(cache: Arc<RateCache>, supported: SupportedCurrencies) -> Self {
        Self { cache, supported }
    }

    /// Codes this converter accepts.
    #[must_use]
    pub fn supported(&self) -> &SupportedCurrencies {
        &self.supported
    }

    /// The underlying rate cache.
    #[must_use]
    pub fn cache(&self) -> &RateCache {
        &self.cache
    }

    /// Converts `amount` from one currency to another.
    ///
    /// Same-currency conversions return the amount unchanged without touching
    /// the cache, even for codes outside the supported list.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount` is negative or the converted amount
    ///   does not fit a `Decimal`
    /// - `UnsupportedCurrency` for codes outside the supported list or
    ///   rejected by the provider
    /// - `RateUnavailable` if neither table quotes the pair
    /// - `RateSourceUnavailable` if rates cannot be fetched and none are cached
    pub fn convert(
        &self,
        amount: Decimal,
        from: CurrencyCode,
        to: CurrencyCode,
        max_age: Duration,
    ) -> Result<Conversion, CurrencyError> {
        let amount = validate_amount(amount)?;
        let resolved = self.rate(from, to, max_age)?;

        let converted = if resolved.method == RateLookupMethod::Identity {
            amount
        } else {
            convert_amount(amount, resolved.rate, MONEY_DECIMAL_PLACES)?
        };

        debug!(
            %amount,
            %from,
            %to,
            rate = %resolved.rate,
            %converted,
            stale = resolved.stale,
            "Converted amount"
        );

        Ok(Conversion {
            source: Money::new(amount, from),
            converted: Money::new(converted, to),
            rate: resolved.rate,
            stale: resolved.stale,
            rates_as_of: resolved.as_of,
        })
    }

    /// Resolves the rate from `from` to `to`.
    ///
    /// Lookup priority:
    /// 1. Identity when the codes are equal
    /// 2. Direct rate from the `from` table
    /// 3. Inverse of the rate for `from` in the `to` table
    ///
    /// # Errors
    ///
    /// Same as [`CurrencyConverter::convert`], minus `InvalidAmount`.
    pub fn rate(
        &self,
        from: CurrencyCode,
        to: CurrencyCode,
        max_age: Duration,
    ) -> Result<ResolvedRate, CurrencyError> {
        if from == to {
            return Ok(ResolvedRate {
                rate: Decimal::ONE,
                method: RateLookupMethod::Identity,
                stale: false,
                as_of: None,
            });
        }

        self.supported.ensure(from)?;
        self.supported.ensure(to)?;

        let from_rates = self.cache.get_rates(from, max_age)?;
        if let Some(rate) = from_rates.table().rate(to) {
            return Ok(ResolvedRate {
                rate,
                method: RateLookupMethod::Direct,
                stale: from_rates.stale,
                as_of: Some(from_rates.table().fetched_at()),
            });
        }

        debug!(%from, %to, "Pair missing from source table, trying inverse");

        let to_rates = self.cache.get_rates(to, max_age)?;
        match to_rates.table().rate(from) {
            Some(inverse) => Ok(ResolvedRate {
                rate: Decimal::ONE / inverse,
                method: RateLookupMethod::Inverse,
                stale: from_rates.stale || to_rates.stale,
                as_of: Some(to_rates.table().fetched_at()),
            }),
            None => Err(CurrencyError::RateUnavailable { from, to }),
        }
    }
}
