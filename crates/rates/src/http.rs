//! HTTP exchange rate provider.

use std::time::Duration;

use chrono::Utc;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use tracing::debug;
use travelfx_core::currency::{ExchangeRateTable, RateSource, RateSourceError};
use travelfx_shared::{CurrencyCode, RatesConfig};

use crate::error::RatesError;
use crate::response::parse_rate_table;

/// Fetches rate tables from an exchangerate-api style endpoint.
///
/// Each call performs exactly one request bounded by the configured timeout.
/// Retries and fallback are left to the rate cache.
pub struct HttpRateSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpRateSource {
    /// Creates a source for `base_url` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `RatesError::Client` if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RatesError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("travelfx/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| RatesError::Client(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.is_empty()),
        })
    }

    /// Creates a source from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `RatesError::Client` if the HTTP client cannot be built.
    pub fn from_config(config: &RatesConfig) -> Result<Self, RatesError> {
        Self::new(config.base_url.clone(), config.api_key.clone(), config.timeout())
    }

    /// The endpoint queried for `base`.
    #[must_use]
    pub fn url_for(&self, base: CurrencyCode) -> String {
        format!("{}/{}", self.base_url, base)
    }
}

impl RateSource for HttpRateSource {
    fn fetch_rates(&self, base: CurrencyCode) -> Result<ExchangeRateTable, RateSourceError> {
        let url = self.url_for(base);
        debug!(%base, %url, "Requesting exchange rates");

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.query(&[("access_key", key)]);
        }

        let response = request.send().map_err(|err| {
            let kind = if err.is_timeout() { "timed out" } else { "failed" };
            RateSourceError::Unavailable(format!("request to {url} {kind}: {err}"))
        })?;

        let status = response.status();
        debug!(%base, %status, "Exchange rate response received");

        if status == StatusCode::NOT_FOUND {
            return Err(RateSourceError::UnsupportedCurrency(base));
        }

        let body = response.text().map_err(|err| {
            RateSourceError::Unavailable(format!("failed to read response body: {err}"))
        })?;

        match parse_rate_table(&body, base, Utc::now()) {
            // Error bodies may come with any status; an explicit
            // unsupported-code answer wins over the status code.
            Err(RateSourceError::UnsupportedCurrency(code)) => {
                Err(RateSourceError::UnsupportedCurrency(code))
            }
            _ if !status.is_success() => Err(RateSourceError::Unavailable(format!(
                "provider returned HTTP {status}"
            ))),
            result => result,
        }
    }
}
