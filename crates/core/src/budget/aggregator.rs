//! Converts expense entries into base-currency category totals.

use std::collections::HashMap;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{debug, warn};
use travelfx_shared::CurrencyCode;

use super::error::BudgetError;
use super::types::{CategoryTotal, EntryDiagnostic, ExpenseEntry, RecomputeMode, TripBudget};
use crate::currency::{CurrencyConverter, checked_total};

/// Aggregates entries through a [`CurrencyConverter`].
///
/// Category totals keep the order in which each category first appears in
/// the entry list, and the grand total is their exact sum.
pub struct BudgetAggregator<'a> {
    converter: &'a CurrencyConverter,
    max_age: Duration,
    mode: RecomputeMode,
}

impl<'a> BudgetAggregator<'a> {
    /// Creates an aggregator.
    #[must_use]
    pub const fn new(converter: &'a CurrencyConverter, max_age: Duration, mode: RecomputeMode) -> Self {
        Self {
            converter,
            max_age,
            mode,
        }
    }

    /// Builds a budget snapshot of `entries` in `base_currency`.
    ///
    /// # Errors
    ///
    /// In strict mode, returns `BudgetError::RecomputeFailed` for the first
    /// entry that cannot be converted or would push the total out of range.
    /// In skip mode such entries are left out and reported in `diagnostics`
    /// instead.
    pub fn aggregate(
        &self,
        base_currency: CurrencyCode,
        entries: &[ExpenseEntry],
    ) -> Result<TripBudget, BudgetError> {
        let mut budget = TripBudget::empty(base_currency);
        let mut positions: HashMap<&str, usize> = HashMap::new();

        let mut grand_total = Decimal::ZERO;

        for entry in entries {
            // Category totals never exceed the grand total, so checking the
            // grand total covers them.
            let result = self
                .converter
                .convert(entry.amount, entry.currency, base_currency, self.max_age)
                .and_then(|conversion| {
                    let total = checked_total([grand_total, conversion.converted.amount])?;
                    Ok((conversion, total))
                });

            let (conversion, total) = match (result, self.mode) {
                (Ok(converted), _) => converted,
                (Err(cause), RecomputeMode::Strict) => {
                    return Err(BudgetError::RecomputeFailed {
                        entry_id: entry.id,
                        cause,
                    });
                }
                (Err(cause), RecomputeMode::SkipUnresolvable) => {
                    warn!(
                        entry_id = %entry.id,
                        currency = %entry.currency,
                        base = %base_currency,
                        error = %cause,
                        "Excluding unconvertible entry from totals"
                    );
                    budget.diagnostics.push(EntryDiagnostic {
                        entry_id: entry.id,
                        category: entry.category.clone(),
                        reason: cause.to_string(),
                    });
                    continue;
                }
            };

            if conversion.stale && !budget.stale_currencies.contains(&entry.currency) {
                budget.stale_currencies.push(entry.currency);
            }

            grand_total = total;
            let amount = conversion.converted.amount;
            match positions.get(entry.category.as_str()) {
                Some(&idx) => budget.totals_by_category[idx].amount += amount,
                None => {
                    positions.insert(entry.category.as_str(), budget.totals_by_category.len());
                    budget.totals_by_category.push(CategoryTotal {
                        category: entry.category.clone(),
                        amount,
                    });
                }
            }
        }

        budget.grand_total = grand_total;
        budget.entries = entries.to_vec();

        debug!(
            base = %base_currency,
            entries = entries.len(),
            categories = budget.totals_by_category.len(),
            grand_total = %budget.grand_total,
            skipped = budget.diagnostics.len(),
            "Aggregated budget"
        );

        Ok(budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::types::Category;
    use crate::currency::testing::{ManualClock, StaticRateSource, code};
    use crate::currency::{CurrencyError, RateCache, SupportedCurrencies};
    use chrono::TimeDelta;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    const HOUR: Duration = Duration::from_secs(3600);

    fn converter(source: Arc<StaticRateSource>, clock: Arc<ManualClock>) -> CurrencyConverter {
        let cache = Arc::new(RateCache::with_clock(source, clock));
        CurrencyConverter::new(cache, SupportedCurrencies::default())
    }

    fn entry(category: &str, amount: Decimal, currency: &str) -> ExpenseEntry {
        ExpenseEntry::new(category, amount, code(currency)).unwrap()
    }

    #[test]
    fn test_mixed_currency_totals() {
        let source = Arc::new(StaticRateSource::new().with_rates("EUR", &[("USD", dec!(1.10))]));
        let converter = converter(source, Arc::new(ManualClock::new()));
        let aggregator = BudgetAggregator::new(&converter, HOUR, RecomputeMode::Strict);

        let entries = vec![
            entry("lodging", dec!(100), "USD"),
            entry("food", dec!(50), "EUR"),
        ];
        let budget = aggregator.aggregate(code("USD"), &entries).unwrap();

        assert_eq!(budget.totals_by_category.len(), 2);
        assert_eq!(budget.totals_by_category[0].category.as_str(), "lodging");
        assert_eq!(budget.totals_by_category[0].amount, dec!(100.00));
        assert_eq!(budget.totals_by_category[1].category.as_str(), "food");
        assert_eq!(budget.totals_by_category[1].amount, dec!(55.00));
        assert_eq!(budget.grand_total, dec!(155.00));
        assert_eq!(budget.entries, entries);
        assert!(budget.stale_currencies.is_empty());
    }

    #[test]
    fn test_categories_merge_in_first_seen_order() {
        let source = Arc::new(StaticRateSource::new());
        let converter = converter(source, Arc::new(ManualClock::new()));
        let aggregator = BudgetAggregator::new(&converter, HOUR, RecomputeMode::Strict);

        let entries = vec![
            entry("food", dec!(12.50), "USD"),
            entry("transport", dec!(3), "USD"),
            entry(" FOOD ", dec!(7.25), "USD"),
        ];
        let budget = aggregator.aggregate(code("USD"), &entries).unwrap();

        let food = Category::new("food").unwrap();
        assert_eq!(budget.totals_by_category.len(), 2);
        assert_eq!(budget.totals_by_category[0].category, food);
        assert_eq!(budget.total_for(&food), dec!(19.75));
        assert_eq!(budget.grand_total, dec!(22.75));
    }

    #[test]
    fn test_empty_entries() {
        let source = Arc::new(StaticRateSource::new());
        let converter = converter(source.clone(), Arc::new(ManualClock::new()));
        let aggregator = BudgetAggregator::new(&converter, HOUR, RecomputeMode::Strict);

        let budget = aggregator.aggregate(code("EUR"), &[]).unwrap();
        assert_eq!(budget, TripBudget::empty(code("EUR")));
        assert_eq!(source.calls(), 0);
    }

    #[test]
    fn test_strict_mode_fails_on_missing_pair() {
        let source = Arc::new(StaticRateSource::new().with_rates("USD", &[("EUR", dec!(0.9))]));
        let converter = converter(source, Arc::new(ManualClock::new()));
        let aggregator = BudgetAggregator::new(&converter, HOUR, RecomputeMode::Strict);

        let bad = entry("food", dec!(10), "JPY");
        let entries = vec![entry("lodging", dec!(100), "USD"), bad.clone()];

        let err = aggregator.aggregate(code("USD"), &entries).unwrap_err();
        assert_eq!(
            err,
            BudgetError::RecomputeFailed {
                entry_id: bad.id,
                cause: CurrencyError::RateUnavailable {
                    from: code("JPY"),
                    to: code("USD"),
                },
            }
        );
    }

    #[test]
    fn test_skip_mode_records_diagnostics() {
        let source = Arc::new(StaticRateSource::new().with_rates("USD", &[("EUR", dec!(0.9))]));
        let converter = converter(source, Arc::new(ManualClock::new()));
        let aggregator = BudgetAggregator::new(&converter, HOUR, RecomputeMode::SkipUnresolvable);

        let bad = entry("food", dec!(10), "JPY");
        let entries = vec![entry("lodging", dec!(100), "USD"), bad.clone()];

        let budget = aggregator.aggregate(code("USD"), &entries).unwrap();
        assert_eq!(budget.grand_total, dec!(100));
        assert_eq!(budget.totals_by_category.len(), 1);
        assert_eq!(budget.entries.len(), 2);
        assert!(budget.is_partial());
        assert_eq!(budget.diagnostics[0].entry_id, bad.id);
        assert!(budget.diagnostics[0].reason.contains("JPY"));
    }

    #[test]
    fn test_stale_currencies_are_reported() {
        let source = Arc::new(
            StaticRateSource::new()
                .with_rates("EUR", &[("USD", dec!(1.10))])
                .with_rates("GBP", &[("USD", dec!(1.25))]),
        );
        let clock = Arc::new(ManualClock::new());
        let converter = converter(source.clone(), clock.clone());
        let aggregator = BudgetAggregator::new(&converter, HOUR, RecomputeMode::Strict);

        let entries = vec![
            entry("food", dec!(50), "EUR"),
            entry("food", dec!(20), "EUR"),
            entry("lodging", dec!(80), "GBP"),
        ];
        aggregator.aggregate(code("USD"), &entries).unwrap();

        clock.advance(TimeDelta::hours(2));
        source.set_failing(true);

        let budget = aggregator.aggregate(code("USD"), &entries).unwrap();
        assert_eq!(budget.stale_currencies, vec![code("EUR"), code("GBP")]);
        assert!(budget.has_stale_rates());
        assert_eq!(budget.grand_total, dec!(177.00));
    }

    #[test]
    fn test_total_out_of_range_names_the_entry() {
        let source = Arc::new(StaticRateSource::new());
        let converter = converter(source, Arc::new(ManualClock::new()));
        let aggregator = BudgetAggregator::new(&converter, HOUR, RecomputeMode::Strict);

        let overflowing = entry("food", Decimal::MAX, "USD");
        let entries = vec![entry("lodging", Decimal::MAX, "USD"), overflowing.clone()];

        let err = aggregator.aggregate(code("USD"), &entries).unwrap_err();
        assert!(matches!(
            err,
            BudgetError::RecomputeFailed {
                entry_id,
                cause: CurrencyError::InvalidAmount(_),
            } if entry_id == overflowing.id
        ));
    }

    #[test]
    fn test_conversion_out_of_range_fails_recompute() {
        let source = Arc::new(StaticRateSource::new().with_rates("EUR", &[("USD", dec!(1.10))]));
        let converter = converter(source, Arc::new(ManualClock::new()));
        let aggregator = BudgetAggregator::new(&converter, HOUR, RecomputeMode::Strict);

        let huge = entry("food", Decimal::MAX, "EUR");
        let err = aggregator.aggregate(code("USD"), &[huge.clone()]).unwrap_err();
        assert!(matches!(
            err,
            BudgetError::RecomputeFailed {
                entry_id,
                cause: CurrencyError::InvalidAmount(_),
            } if entry_id == huge.id
        ));
    }

    #[test]
    fn test_skip_mode_leaves_out_overflowing_entry() {
        let source = Arc::new(StaticRateSource::new());
        let converter = converter(source, Arc::new(ManualClock::new()));
        let aggregator = BudgetAggregator::new(&converter, HOUR, RecomputeMode::SkipUnresolvable);

        let entries = vec![
            entry("lodging", Decimal::MAX, "USD"),
            entry("food", Decimal::MAX, "USD"),
            entry("misc", dec!(0), "USD"),
        ];
        let budget = aggregator.aggregate(code("USD"), &entries).unwrap();

        assert_eq!(budget.grand_total, Decimal::MAX);
        assert_eq!(budget.totals_by_category.len(), 2);
        assert_eq!(budget.diagnostics.len(), 1);
        assert_eq!(budget.diagnostics[0].entry_id, entries[1].id);
    }
}
