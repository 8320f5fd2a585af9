//! Budget data types.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use travelfx_shared::{BudgetConfig, CurrencyCode, EntryId, RatesConfig};

use super::error::BudgetError;
use crate::currency::conversion::validate_amount;

/// Longest accepted category name, in characters.
pub const MAX_CATEGORY_LEN: usize = 64;

/// An expense category such as `lodging` or `food`.
///
/// Names are trimmed and lower-cased, so `" Food "` and `"food"` are the
/// same category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Category(String);

impl Category {
    /// Validates and normalizes a category name.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::InvalidCategory` if the name is blank, longer
    /// than [`MAX_CATEGORY_LEN`] or contains control characters.
    pub fn new(name: &str) -> Result<Self, BudgetError> {
        let normalized = name.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(BudgetError::InvalidCategory("name is empty".to_string()));
        }
        if normalized.chars().count() > MAX_CATEGORY_LEN {
            return Err(BudgetError::InvalidCategory(format!(
                "'{normalized}' is longer than {MAX_CATEGORY_LEN} characters"
            )));
        }
        if normalized.chars().any(char::is_control) {
            return Err(BudgetError::InvalidCategory(format!(
                "'{}' contains control characters",
                normalized.escape_debug()
            )));
        }
        Ok(Self(normalized))
    }

    /// Built-in category names that are known to be valid.
    pub(crate) fn builtin(name: &'static str) -> Self {
        Self(name.to_string())
    }

    /// Returns the category name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Category {
    type Error = BudgetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.0
    }
}

/// A single itemized trip expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawExpenseEntry")]
pub struct ExpenseEntry {
    /// Entry ID.
    pub id: EntryId,
    /// Expense category.
    pub category: Category,
    /// Amount in `currency`. Never negative.
    pub amount: Decimal,
    /// Currency the expense is paid in.
    pub currency: CurrencyCode,
    /// Optional free-form note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Unvalidated wire form; a missing `id` gets a fresh one.
#[derive(Deserialize)]
struct RawExpenseEntry {
    #[serde(default)]
    id: EntryId,
    category: String,
    amount: Decimal,
    currency: CurrencyCode,
    #[serde(default)]
    note: Option<String>,
}

impl TryFrom<RawExpenseEntry> for ExpenseEntry {
    type Error = BudgetError;

    fn try_from(raw: RawExpenseEntry) -> Result<Self, Self::Error> {
        let mut entry = Self::new(&raw.category, raw.amount, raw.currency)?;
        entry.id = raw.id;
        entry.note = raw.note;
        Ok(entry)
    }
}

impl ExpenseEntry {
    /// Creates an entry with a fresh ID.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::InvalidCategory` or `BudgetError::InvalidAmount`.
    pub fn new(category: &str, amount: Decimal, currency: CurrencyCode) -> Result<Self, BudgetError> {
        let category = Category::new(category)?;
        let amount =
            validate_amount(amount).map_err(|err| BudgetError::InvalidAmount(err.to_string()))?;
        Ok(Self {
            id: EntryId::new(),
            category,
            amount,
            currency,
            note: None,
        })
    }
}

/// Total of one category in the base currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    /// Category.
    pub category: Category,
    /// Sum of converted amounts.
    pub amount: Decimal,
}

/// An entry left out of the totals under skip-unresolvable mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryDiagnostic {
    /// The excluded entry.
    pub entry_id: EntryId,
    /// Its category.
    pub category: Category,
    /// Why it could not be converted.
    pub reason: String,
}

/// A consistent snapshot of a trip budget.
///
/// `grand_total` always equals the sum of `totals_by_category`, and both
/// reflect exactly `entries` converted into `base_currency`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripBudget {
    /// Currency totals are reported in.
    pub base_currency: CurrencyCode,
    /// Entries in insertion order.
    pub entries: Vec<ExpenseEntry>,
    /// Category totals in first-seen order.
    pub totals_by_category: Vec<CategoryTotal>,
    /// Sum of all category totals.
    pub grand_total: Decimal,
    /// Entry currencies whose conversion used stale rates.
    pub stale_currencies: Vec<CurrencyCode>,
    /// Entries excluded from the totals.
    pub diagnostics: Vec<EntryDiagnostic>,
}

impl TripBudget {
    /// An empty budget reporting in `base_currency`.
    #[must_use]
    pub const fn empty(base_currency: CurrencyCode) -> Self {
        Self {
            base_currency,
            entries: Vec::new(),
            totals_by_category: Vec::new(),
            grand_total: Decimal::ZERO,
            stale_currencies: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Total for `category`, zero if it has no entries.
    #[must_use]
    pub fn total_for(&self, category: &Category) -> Decimal {
        self.totals_by_category
            .iter()
            .find(|total| &total.category == category)
            .map_or(Decimal::ZERO, |total| total.amount)
    }

    /// Returns true if any conversion used stale rates.
    #[must_use]
    pub fn has_stale_rates(&self) -> bool {
        !self.stale_currencies.is_empty()
    }

    /// Returns true if some entries were left out of the totals.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// What to do with entries whose conversion fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecomputeMode {
    /// Fail the whole recompute.
    #[default]
    Strict,
    /// Exclude the entry and record a diagnostic.
    SkipUnresolvable,
}

/// Settings a trip budget is created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetSettings {
    /// Initial base currency.
    pub base_currency: CurrencyCode,
    /// Freshness window passed to every conversion.
    pub max_age: Duration,
    /// Failure handling for unconvertible entries.
    pub mode: RecomputeMode,
}

impl BudgetSettings {
    /// Builds settings from loaded configuration.
    #[must_use]
    pub fn from_config(budget: &BudgetConfig, rates: &RatesConfig) -> Self {
        Self {
            base_currency: budget.base_currency,
            max_age: rates.cache_max_age(),
            mode: if budget.skip_unresolvable {
                RecomputeMode::SkipUnresolvable
            } else {
                RecomputeMode::Strict
            },
        }
    }
}

/// How much of the budget a category takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// More than 25% of the total.
    High,
    /// More than 10% of the total.
    Medium,
    /// 10% or less.
    Low,
}

impl Priority {
    /// Classifies a percentage of the total.
    #[must_use]
    pub fn from_percentage(percentage: Decimal) -> Self {
        if percentage > Decimal::from(25) {
            Self::High
        } else if percentage > Decimal::TEN {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// One row of a chart-ready breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakdownItem {
    /// Category.
    pub category: Category,
    /// Category total in the base currency.
    pub amount: Decimal,
    /// Share of the grand total in percent, 2 decimal places.
    pub percentage: Decimal,
    /// Relative weight of the category.
    pub priority: Priority,
}

/// Chart-ready view of a trip budget.
///
/// Percentages sum to exactly 100.00 when the grand total is positive, and
/// are all zero otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetBreakdown {
    /// Currency amounts are reported in.
    pub base_currency: CurrencyCode,
    /// Sum of all item amounts.
    pub grand_total: Decimal,
    /// Items in the budget's category order.
    pub items: Vec<BreakdownItem>,
    /// True if any underlying conversion used stale rates.
    pub stale_rates: bool,
}

impl BudgetBreakdown {
    /// Items ordered by amount, largest first.
    #[must_use]
    pub fn largest_first(&self) -> Vec<BreakdownItem> {
        let mut items = self.items.clone();
        items.sort_by(|a, b| b.amount.cmp(&a.amount));
        items
    }
}
