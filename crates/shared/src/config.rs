//! Application configuration management.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::CurrencyCode;

/// Currency codes accepted when no explicit list is configured.
pub const DEFAULT_SUPPORTED_CURRENCIES: &[&str] = &[
    "AED", "ARS", "AUD", "BDT", "BRL", "CAD", "CHF", "CLP", "CNY", "COP", "CZK", "DKK", "EGP",
    "EUR", "GBP", "HKD", "HUF", "IDR", "ILS", "INR", "JPY", "KRW", "MXN", "MYR", "NGN", "NOK",
    "NZD", "PHP", "PKR", "PLN", "RUB", "SAR", "SEK", "SGD", "THB", "TRY", "TWD", "USD", "VND",
    "ZAR",
];

/// Expense categories offered when no explicit list is configured.
pub const DEFAULT_CATEGORIES: &[&str] = &["lodging", "food", "transport", "activities", "misc"];

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Exchange rate provider configuration.
    #[serde(default)]
    pub rates: RatesConfig,
    /// Budget engine configuration.
    #[serde(default)]
    pub budget: BudgetConfig,
}

/// Exchange rate provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RatesConfig {
    /// Provider endpoint; the base currency code is appended as a path segment.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Optional provider API key, sent as the `access_key` query parameter.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Freshness window for cached rate tables in seconds.
    #[serde(default = "default_cache_max_age_secs")]
    pub cache_max_age_secs: u64,
    /// Where to persist the rate cache between runs. No persistence when unset.
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
}

fn default_base_url() -> String {
    "https://api.exchangerate-api.com/v4/latest".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_cache_max_age_secs() -> u64 {
    3600 // 1 hour
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            cache_max_age_secs: default_cache_max_age_secs(),
            snapshot_path: None,
        }
    }
}

impl RatesConfig {
    /// Request timeout as a `Duration`.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Cache freshness window as a `Duration`.
    #[must_use]
    pub const fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.cache_max_age_secs)
    }
}

/// Budget engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetConfig {
    /// Currency new trip budgets report in.
    #[serde(default = "default_base_currency")]
    pub base_currency: CurrencyCode,
    /// Codes accepted for entries and conversions.
    #[serde(default = "default_supported_currencies")]
    pub supported_currencies: Vec<CurrencyCode>,
    /// Categories offered to the user.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    /// Exclude entries whose conversion fails instead of failing the recompute.
    #[serde(default)]
    pub skip_unresolvable: bool,
}

fn default_base_currency() -> CurrencyCode {
    CurrencyCode::USD
}

fn default_supported_currencies() -> Vec<CurrencyCode> {
    DEFAULT_SUPPORTED_CURRENCIES
        .iter()
        .filter_map(|code| CurrencyCode::parse(code).ok())
        .collect()
}

fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(ToString::to_string).collect()
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            base_currency: default_base_currency(),
            supported_currencies: default_supported_currencies(),
            categories: default_categories(),
            skip_unresolvable: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones overriding earlier ones:
    /// `config/default.toml`, `config/{RUN_MODE}.toml`, `TRAVELFX__*` variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("TRAVELFX")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("budget.supported_currencies")
                    .with_list_parse_key("budget.categories"),
            )
            .build()?;

        config.try_deserialize()
    }
}
