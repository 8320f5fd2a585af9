//! Budget error types.

use thiserror::Error;
use travelfx_shared::{AppError, CurrencyCode, EntryId};

use crate::currency::CurrencyError;

/// Budget-related errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BudgetError {
    /// An entry could not be converted into the base currency.
    #[error("Budget recompute failed at entry {entry_id}: {cause}")]
    RecomputeFailed {
        /// The offending entry.
        entry_id: EntryId,
        /// Why its conversion failed.
        #[source]
        cause: CurrencyError,
    },

    /// Entry not found.
    #[error("Expense entry not found: {0}")]
    EntryNotFound(EntryId),

    /// An entry with this ID already exists.
    #[error("Expense entry already exists: {0}")]
    DuplicateEntry(EntryId),

    /// Category name is empty, too long or contains control characters.
    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    /// Amount is negative or not finite.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Currency not in the supported list.
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(CurrencyCode),
}

impl From<BudgetError> for AppError {
    fn from(err: BudgetError) -> Self {
        let message = err.to_string();
        match err {
            BudgetError::RecomputeFailed { cause, .. } => match AppError::from(cause) {
                Self::Conversion(_) => Self::Conversion(message),
                Self::RatesUnavailable(_) => Self::RatesUnavailable(message),
                Self::UnsupportedCurrency(code) => Self::UnsupportedCurrency(code),
                _ => Self::Budget(message),
            },
            BudgetError::EntryNotFound(_) | BudgetError::DuplicateEntry(_) => Self::Budget(message),
            BudgetError::InvalidCategory(_) | BudgetError::InvalidAmount(_) => {
                Self::Validation(message)
            }
            BudgetError::UnsupportedCurrency(code) => Self::UnsupportedCurrency(code.to_string()),
        }
    }
}
