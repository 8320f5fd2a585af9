//! Provider response parsing.
//!
//! The provider answers `GET {base_url}/{BASE}` with
//!
//! ```json
//! { "base": "USD", "rates": { "EUR": 0.92, "JPY": 151.3 }, "time_last_updated": 1700000000 }
//! ```
//!
//! or, for failures, `{ "result": "error", "error-type": "unsupported-code" }`.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use travelfx_core::currency::{ExchangeRateTable, RateSourceError};
use travelfx_shared::CurrencyCode;

/// Provider error type for codes it does not know.
const UNSUPPORTED_CODE: &str = "unsupported-code";

#[derive(Debug, Deserialize)]
struct RateResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default, rename = "error-type")]
    error_type: Option<String>,
    #[serde(default)]
    base: Option<String>,
    #[serde(default)]
    rates: Option<BTreeMap<String, serde_json::Number>>,
    #[serde(default)]
    time_last_updated: Option<i64>,
}

/// Parses a provider body into a validated table for `requested`.
///
/// `now` is used as the fetch time when the provider does not report one.
pub(crate) fn parse_rate_table(
    body: &str,
    requested: CurrencyCode,
    now: DateTime<Utc>,
) -> Result<ExchangeRateTable, RateSourceError> {
    let response: RateResponse = serde_json::from_str(body)
        .map_err(|err| malformed(format!("invalid JSON: {err}")))?;

    if response.result.as_deref() == Some("error") {
        return Err(match response.error_type.as_deref() {
            Some(UNSUPPORTED_CODE) => RateSourceError::UnsupportedCurrency(requested),
            Some(other) => RateSourceError::Unavailable(format!("provider error: {other}")),
            None => RateSourceError::Unavailable("provider error".to_string()),
        });
    }

    let base = response
        .base
        .ok_or_else(|| malformed("missing 'base'"))
        .and_then(|raw| {
            CurrencyCode::parse(&raw).map_err(|err| malformed(format!("bad base: {err}")))
        })?;
    if base != requested {
        return Err(malformed(format!(
            "requested {requested} rates, provider answered with {base}"
        )));
    }

    let raw_rates = response.rates.ok_or_else(|| malformed("missing 'rates'"))?;
    let mut rates = Vec::with_capacity(raw_rates.len());
    for (raw_code, raw_rate) in raw_rates {
        let code = CurrencyCode::parse(&raw_code)
            .map_err(|err| malformed(format!("bad currency code: {err}")))?;
        let rate = parse_decimal(&raw_rate)
            .ok_or_else(|| malformed(format!("bad rate for {code}: {raw_rate}")))?;
        rates.push((code, rate));
    }

    let fetched_at = match response.time_last_updated {
        Some(secs) => DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| malformed(format!("bad timestamp {secs}")))?,
        None => now,
    };

    ExchangeRateTable::new(base, rates, fetched_at).map_err(|err| malformed(err.to_string()))
}

/// Goes through the number's textual form so no binary float is involved.
fn parse_decimal(number: &serde_json::Number) -> Option<Decimal> {
    let text = number.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn malformed(reason: impl Into<String>) -> RateSourceError {
    RateSourceError::Unavailable(format!("malformed provider response: {}", reason.into()))
}
