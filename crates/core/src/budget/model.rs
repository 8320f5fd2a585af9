//! Mutable trip budget with all-or-nothing recomputation.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{info, warn};
use travelfx_shared::{CurrencyCode, EntryId};

use super::aggregator::BudgetAggregator;
use super::error::BudgetError;
use super::types::{BudgetSettings, ExpenseEntry, RecomputeMode, TripBudget};
use crate::currency::CurrencyConverter;

/// A trip budget that keeps its totals in step with its entries.
///
/// Every mutation converts the full entry list into the base currency and
/// only then replaces the current snapshot. If the recompute fails the
/// mutation is rolled back and the previous snapshot stays in place, so
/// readers never see totals that disagree with the entries.
pub struct TripBudgetModel {
    converter: Arc<CurrencyConverter>,
    max_age: Duration,
    mode: RecomputeMode,
    current: Mutex<TripBudget>,
}

impl TripBudgetModel {
    /// Creates an empty budget.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::UnsupportedCurrency` if the base currency is
    /// not accepted by `converter`.
    pub fn new(converter: Arc<CurrencyConverter>, settings: BudgetSettings) -> Result<Self, BudgetError> {
        ensure_supported(&converter, settings.base_currency)?;
        Ok(Self {
            converter,
            max_age: settings.max_age,
            mode: settings.mode,
            current: Mutex::new(TripBudget::empty(settings.base_currency)),
        })
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> TripBudget {
        self.lock().clone()
    }

    /// Returns the current base currency.
    #[must_use]
    pub fn base_currency(&self) -> CurrencyCode {
        self.lock().base_currency
    }

    /// Adds an entry and recomputes.
    ///
    /// # Errors
    ///
    /// - `UnsupportedCurrency` if the entry's currency is not accepted
    /// - `DuplicateEntry` if an entry with the same ID exists
    /// - `RecomputeFailed` if the new entry list cannot be converted
    pub fn add_entry(&self, entry: ExpenseEntry) -> Result<TripBudget, BudgetError> {
        self.add_entries([entry])
    }

    /// Adds several entries with a single recompute. Either all of them are
    /// added or none is.
    ///
    /// # Errors
    ///
    /// Same as [`TripBudgetModel::add_entry`].
    pub fn add_entries(
        &self,
        entries: impl IntoIterator<Item = ExpenseEntry>,
    ) -> Result<TripBudget, BudgetError> {
        let mut current = self.lock();
        let mut candidate = current.entries.clone();

        for entry in entries {
            ensure_supported(&self.converter, entry.currency)?;
            if candidate.iter().any(|existing| existing.id == entry.id) {
                return Err(BudgetError::DuplicateEntry(entry.id));
            }
            candidate.push(entry);
        }

        let base = current.base_currency;
        self.commit(&mut current, base, &candidate)
    }

    /// Removes an entry and recomputes.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` for an unknown ID and `RecomputeFailed` if
    /// the remaining entries cannot be converted.
    pub fn remove_entry(&self, id: EntryId) -> Result<TripBudget, BudgetError> {
        let mut current = self.lock();
        let position = current
            .entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or(BudgetError::EntryNotFound(id))?;

        let mut candidate = current.entries.clone();
        candidate.remove(position);

        let base = current.base_currency;
        self.commit(&mut current, base, &candidate)
    }

    /// Switches the base currency and recomputes every total in it.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedCurrency` for a code outside the supported list
    /// and `RecomputeFailed` if an entry cannot be converted into it.
    pub fn set_base_currency(&self, base: CurrencyCode) -> Result<TripBudget, BudgetError> {
        ensure_supported(&self.converter, base)?;
        let mut current = self.lock();
        let entries = current.entries.clone();
        let previous = current.base_currency;

        let budget = self.commit(&mut current, base, &entries)?;
        if previous != base {
            info!(from = %previous, to = %base, "Budget base currency changed");
        }
        Ok(budget)
    }

    /// Recomputes totals with the current entries, refreshing expired rates.
    ///
    /// # Errors
    ///
    /// Returns `RecomputeFailed` if an entry cannot be converted; the
    /// previous snapshot is kept.
    pub fn recompute(&self) -> Result<TripBudget, BudgetError> {
        let mut current = self.lock();
        let entries = current.entries.clone();
        let base = current.base_currency;
        self.commit(&mut current, base, &entries)
    }

    fn commit(
        &self,
        current: &mut TripBudget,
        base: CurrencyCode,
        entries: &[ExpenseEntry],
    ) -> Result<TripBudget, BudgetError> {
        let aggregator = BudgetAggregator::new(&self.converter, self.max_age, self.mode);
        match aggregator.aggregate(base, entries) {
            Ok(budget) => {
                *current = budget.clone();
                Ok(budget)
            }
            Err(err) => {
                warn!(error = %err, "Budget recompute failed, keeping previous totals");
                Err(err)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, TripBudget> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn ensure_supported(converter: &CurrencyConverter, code: CurrencyCode) -> Result<(), BudgetError> {
    if converter.supported().contains(code) {
        Ok(())
    } else {
        Err(BudgetError::UnsupportedCurrency(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::testing::{ManualClock, StaticRateSource, code};
    use crate::currency::{CurrencyError, RateCache, SupportedCurrencies};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const HOUR: Duration = Duration::from_secs(3600);

    fn settings(mode: RecomputeMode) -> BudgetSettings {
        BudgetSettings {
            base_currency: code("USD"),
            max_age: HOUR,
            mode,
        }
    }

    fn model_with(source: Arc<StaticRateSource>, mode: RecomputeMode) -> TripBudgetModel {
        let cache = Arc::new(RateCache::with_clock(source, Arc::new(ManualClock::new())));
        let converter = Arc::new(CurrencyConverter::new(cache, SupportedCurrencies::default()));
        TripBudgetModel::new(converter, settings(mode)).unwrap()
    }

    fn eur_usd_source() -> Arc<StaticRateSource> {
        Arc::new(
            StaticRateSource::new()
                .with_rates("EUR", &[("USD", dec!(1.10))])
                .with_rates("USD", &[("EUR", dec!(0.90))]),
        )
    }

    #[test]
    fn test_new_model_is_empty() {
        let model = model_with(eur_usd_source(), RecomputeMode::Strict);
        let snapshot = model.snapshot();
        assert_eq!(snapshot, TripBudget::empty(code("USD")));
        assert_eq!(model.base_currency(), code("USD"));
    }

    #[test]
    fn test_new_rejects_unsupported_base() {
        let cache = Arc::new(RateCache::new(eur_usd_source()));
        let converter = Arc::new(CurrencyConverter::new(
            cache,
            SupportedCurrencies::new([code("USD"), code("EUR")]),
        ));
        let mut settings = settings(RecomputeMode::Strict);
        settings.base_currency = code("JPY");

        assert!(matches!(
            TripBudgetModel::new(converter, settings),
            Err(BudgetError::UnsupportedCurrency(c)) if c == code("JPY")
        ));
    }

    #[test]
    fn test_add_entry_updates_totals() {
        let model = model_with(eur_usd_source(), RecomputeMode::Strict);

        model
            .add_entry(ExpenseEntry::new("lodging", dec!(100), code("USD")).unwrap())
            .unwrap();
        let budget = model
            .add_entry(ExpenseEntry::new("food", dec!(50), code("EUR")).unwrap())
            .unwrap();

        assert_eq!(budget.entries.len(), 2);
        assert_eq!(budget.grand_total, dec!(155.00));
        assert_eq!(model.snapshot(), budget);
    }

    #[test]
    fn test_add_entry_rejects_unsupported_currency() {
        let model = model_with(eur_usd_source(), RecomputeMode::Strict);
        let result = model.add_entry(ExpenseEntry::new("food", dec!(1), code("XAU")).unwrap());

        assert!(matches!(result, Err(BudgetError::UnsupportedCurrency(_))));
        assert!(model.snapshot().entries.is_empty());
    }

    #[test]
    fn test_add_entry_rejects_duplicate_id() {
        let model = model_with(eur_usd_source(), RecomputeMode::Strict);
        let entry = ExpenseEntry::new("food", dec!(10), code("USD")).unwrap();
        model.add_entry(entry.clone()).unwrap();

        assert_eq!(
            model.add_entry(entry.clone()),
            Err(BudgetError::DuplicateEntry(entry.id))
        );
        assert_eq!(model.snapshot().entries.len(), 1);
    }

    #[test]
    fn test_failed_add_rolls_back() {
        let model = model_with(eur_usd_source(), RecomputeMode::Strict);
        model
            .add_entry(ExpenseEntry::new("lodging", dec!(100), code("USD")).unwrap())
            .unwrap();
        let before = model.snapshot();

        let bad = ExpenseEntry::new("food", dec!(1000), code("JPY")).unwrap();
        let err = model.add_entry(bad.clone()).unwrap_err();

        assert!(matches!(
            err,
            BudgetError::RecomputeFailed { entry_id, cause: CurrencyError::RateUnavailable { .. } }
                if entry_id == bad.id
        ));
        assert_eq!(model.snapshot(), before);
    }

    #[test]
    fn test_add_entries_is_atomic() {
        let model = model_with(eur_usd_source(), RecomputeMode::Strict);
        let good = ExpenseEntry::new("food", dec!(10), code("USD")).unwrap();
        let bad = ExpenseEntry::new("food", dec!(10), code("XAU")).unwrap();

        assert!(model.add_entries([good.clone(), bad]).is_err());
        assert!(model.snapshot().entries.is_empty());

        let budget = model.add_entries([good]).unwrap();
        assert_eq!(budget.grand_total, dec!(10));
    }

    #[test]
    fn test_add_entries_beyond_decimal_range_is_rejected() {
        let model = model_with(eur_usd_source(), RecomputeMode::Strict);
        let lodging = ExpenseEntry::new("lodging", Decimal::MAX, code("USD")).unwrap();
        let food = ExpenseEntry::new("food", Decimal::MAX, code("USD")).unwrap();

        let err = model.add_entries([lodging, food.clone()]).unwrap_err();
        assert!(matches!(
            err,
            BudgetError::RecomputeFailed { entry_id, cause: CurrencyError::InvalidAmount(_) }
                if entry_id == food.id
        ));
        assert!(model.snapshot().entries.is_empty());

        let converted = ExpenseEntry::new("food", Decimal::MAX, code("EUR")).unwrap();
        assert!(model.add_entry(converted).is_err());
        assert_eq!(model.snapshot(), TripBudget::empty(code("USD")));
    }

    #[test]
    fn test_skip_mode_keeps_unconvertible_entry() {
        let model = model_with(eur_usd_source(), RecomputeMode::SkipUnresolvable);
        model
            .add_entry(ExpenseEntry::new("lodging", dec!(100), code("USD")).unwrap())
            .unwrap();
        let budget = model
            .add_entry(ExpenseEntry::new("food", dec!(1000), code("JPY")).unwrap())
            .unwrap();

        assert_eq!(budget.entries.len(), 2);
        assert_eq!(budget.grand_total, dec!(100));
        assert_eq!(budget.diagnostics.len(), 1);
    }

    #[test]
    fn test_remove_entry() {
        let model = model_with(eur_usd_source(), RecomputeMode::Strict);
        let food = ExpenseEntry::new("food", dec!(50), code("EUR")).unwrap();
        model
            .add_entries([
                ExpenseEntry::new("lodging", dec!(100), code("USD")).unwrap(),
                food.clone(),
            ])
            .unwrap();

        let budget = model.remove_entry(food.id).unwrap();
        assert_eq!(budget.entries.len(), 1);
        assert_eq!(budget.grand_total, dec!(100));
        assert_eq!(budget.totals_by_category.len(), 1);

        assert_eq!(
            model.remove_entry(food.id),
            Err(BudgetError::EntryNotFound(food.id))
        );
    }

    #[test]
    fn test_set_base_currency_recomputes() {
        let model = model_with(eur_usd_source(), RecomputeMode::Strict);
        model
            .add_entries([
                ExpenseEntry::new("lodging", dec!(100), code("USD")).unwrap(),
                ExpenseEntry::new("food", dec!(50), code("EUR")).unwrap(),
            ])
            .unwrap();

        let budget = model.set_base_currency(code("EUR")).unwrap();
        assert_eq!(budget.base_currency, code("EUR"));
        assert_eq!(budget.totals_by_category[0].amount, dec!(90.00));
        assert_eq!(budget.totals_by_category[1].amount, dec!(50));
        assert_eq!(budget.grand_total, dec!(140.00));
    }

    #[test]
    fn test_failed_base_switch_keeps_previous_base() {
        let model = model_with(eur_usd_source(), RecomputeMode::Strict);
        model
            .add_entry(ExpenseEntry::new("lodging", dec!(100), code("USD")).unwrap())
            .unwrap();
        let before = model.snapshot();

        assert!(matches!(
            model.set_base_currency(code("JPY")),
            Err(BudgetError::RecomputeFailed { .. })
        ));
        assert_eq!(model.snapshot(), before);
        assert_eq!(model.base_currency(), code("USD"));
    }

    #[test]
    fn test_recompute_picks_up_new_rates() {
        let source = eur_usd_source();
        let cache = Arc::new(RateCache::with_clock(
            source.clone(),
            Arc::new(ManualClock::new()),
        ));
        let converter = Arc::new(CurrencyConverter::new(
            cache.clone(),
            SupportedCurrencies::default(),
        ));
        let model = TripBudgetModel::new(converter, settings(RecomputeMode::Strict)).unwrap();
        model
            .add_entry(ExpenseEntry::new("food", dec!(50), code("EUR")).unwrap())
            .unwrap();

        source.set_rates("EUR", &[("USD", dec!(1.20))]);
        cache.invalidate(code("EUR"));

        let budget = model.recompute().unwrap();
        assert_eq!(budget.grand_total, dec!(60.00));
    }

    #[test]
    fn test_failed_recompute_keeps_snapshot() {
        let source = eur_usd_source();
        let cache = Arc::new(RateCache::with_clock(
            source.clone(),
            Arc::new(ManualClock::new()),
        ));
        let converter = Arc::new(CurrencyConverter::new(
            cache.clone(),
            SupportedCurrencies::default(),
        ));
        let model = TripBudgetModel::new(converter, settings(RecomputeMode::Strict)).unwrap();
        let before = model
            .add_entry(ExpenseEntry::new("food", dec!(50), code("EUR")).unwrap())
            .unwrap();

        source.set_failing(true);
        cache.invalidate_all();

        assert!(matches!(
            model.recompute(),
            Err(BudgetError::RecomputeFailed {
                cause: CurrencyError::RateSourceUnavailable { .. },
                ..
            })
        ));
        assert_eq!(model.snapshot(), before);
    }
}
