//! Supported currency list and display names.

use std::borrow::Cow;
use std::collections::BTreeSet;

use travelfx_shared::CurrencyCode;

use super::error::CurrencyError;

const CURRENCY_NAMES: &[(&str, &str)] = &[
    ("AED", "UAE Dirham"),
    ("ARS", "Argentine Peso"),
    ("AUD", "Australian Dollar"),
    ("BDT", "Bangladeshi Taka"),
    ("BRL", "Brazilian Real"),
    ("CAD", "Canadian Dollar"),
    ("CHF", "Swiss Franc"),
    ("CLP", "Chilean Peso"),
    ("CNY", "Chinese Yuan"),
    ("COP", "Colombian Peso"),
    ("CZK", "Czech Koruna"),
    ("DKK", "Danish Krone"),
    ("EGP", "Egyptian Pound"),
    ("EUR", "Euro"),
    ("GBP", "British Pound"),
    ("HKD", "Hong Kong Dollar"),
    ("HUF", "Hungarian Forint"),
    ("IDR", "Indonesian Rupiah"),
    ("ILS", "Israeli Shekel"),
    ("INR", "Indian Rupee"),
    ("JPY", "Japanese Yen"),
    ("KRW", "South Korean Won"),
    ("MXN", "Mexican Peso"),
    ("MYR", "Malaysian Ringgit"),
    ("NGN", "Nigerian Naira"),
    ("NOK", "Norwegian Krone"),
    ("NZD", "New Zealand Dollar"),
    ("PHP", "Philippine Peso"),
    ("PKR", "Pakistani Rupee"),
    ("PLN", "Polish Zloty"),
    ("RUB", "Russian Ruble"),
    ("SAR", "Saudi Riyal"),
    ("SEK", "Swedish Krona"),
    ("SGD", "Singapore Dollar"),
    ("THB", "Thai Baht"),
    ("TRY", "Turkish Lira"),
    ("TWD", "Taiwan Dollar"),
    ("USD", "US Dollar"),
    ("VND", "Vietnamese Dong"),
    ("ZAR", "South African Rand"),
];

/// The set of currency codes accepted as input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedCurrencies {
    codes: BTreeSet<CurrencyCode>,
}

impl SupportedCurrencies {
    /// Creates a registry from configured codes.
    #[must_use]
    pub fn new(codes: impl IntoIterator<Item = CurrencyCode>) -> Self {
        Self {
            codes: codes.into_iter().collect(),
        }
    }

    /// Returns true if `code` is accepted.
    #[must_use]
    pub fn contains(&self, code: CurrencyCode) -> bool {
        self.codes.contains(&code)
    }

    /// Checks that `code` is accepted.
    ///
    /// # Errors
    ///
    /// Returns `CurrencyError::UnsupportedCurrency` otherwise.
    pub fn ensure(&self, code: CurrencyCode) -> Result<CurrencyCode, CurrencyError> {
        if self.contains(code) {
            Ok(code)
        } else {
            Err(CurrencyError::UnsupportedCurrency(code))
        }
    }

    /// Accepted codes in alphabetical order.
    pub fn iter(&self) -> impl Iterator<Item = CurrencyCode> + '_ {
        self.codes.iter().copied()
    }

    /// Number of accepted codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Returns true if nothing is accepted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl Default for SupportedCurrencies {
    fn default() -> Self {
        Self::new(
            CURRENCY_NAMES
                .iter()
                .filter_map(|(code, _)| CurrencyCode::parse(code).ok()),
        )
    }
}

/// Human-readable name of a currency, or the code itself when unknown.
#[must_use]
pub fn currency_name(code: CurrencyCode) -> Cow<'static, str> {
    CURRENCY_NAMES
        .iter()
        .find(|(known, _)| *known == code.as_str())
        .map_or_else(|| Cow::Owned(code.to_string()), |(_, name)| Cow::Borrowed(*name))
}
