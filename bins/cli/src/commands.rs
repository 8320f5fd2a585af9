//! Command handlers. Each returns a serializable report.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;
use travelfx_core::budget::{
    BreakdownExporter, BudgetBreakdown, BudgetPlanner, BudgetWarning,
    DEFAULT_EMERGENCY_FUND_PERCENT, ExpenseEntry, TravelStyle, TripBudget, TripEstimate,
};
use travelfx_core::currency::{Conversion, currency_name};
use travelfx_shared::{AppError, AppResult, CurrencyCode};

use crate::app::App;

/// A trip file as read by `breakdown`.
#[derive(Debug, Deserialize)]
pub struct TripFile {
    /// Reporting currency; the configured default when absent.
    #[serde(default)]
    pub base_currency: Option<CurrencyCode>,
    /// Itemized expenses.
    pub entries: Vec<ExpenseEntry>,
}

impl TripFile {
    /// Reads and validates a trip file.
    pub fn read(path: &Path) -> AppResult<Self> {
        let text = fs::read_to_string(path).map_err(|err| {
            AppError::Validation(format!("cannot read {}: {err}", path.display()))
        })?;
        serde_json::from_str(&text).map_err(|err| {
            AppError::Validation(format!("invalid trip file {}: {err}", path.display()))
        })
    }
}

/// Output of `breakdown`.
#[derive(Debug, Serialize)]
pub struct BreakdownReport {
    /// Entries and category totals in the base currency.
    pub budget: TripBudget,
    /// Percentage share of each category.
    pub breakdown: BudgetBreakdown,
    /// Allocation advice for the totals.
    pub warnings: Vec<BudgetWarning>,
}

/// Output of `estimate`.
#[derive(Debug, Serialize)]
pub struct EstimateReport {
    /// Per-category estimate in the requested currency.
    pub estimate: TripEstimate,
    /// Estimated total per day.
    pub daily_budget: Decimal,
    /// Estimated total per traveler.
    pub per_person_budget: Decimal,
    /// Suggested emergency reserve.
    pub emergency_fund: Decimal,
}

/// One row of `currencies`.
#[derive(Debug, Serialize)]
pub struct CurrencyInfo {
    /// ISO 4217 code.
    pub code: CurrencyCode,
    /// Display name, or the code when none is known.
    pub name: Cow<'static, str>,
}

/// Converts `amount` and warns when the rates are stale.
pub fn convert(
    app: &App,
    amount: Decimal,
    from: CurrencyCode,
    to: CurrencyCode,
) -> AppResult<Conversion> {
    let conversion = app.converter().convert(amount, from, to, app.max_age())?;
    if conversion.stale {
        warn!(
            %from,
            %to,
            rates_as_of = ?conversion.rates_as_of,
            "Rates could not be refreshed, using the last known rates"
        );
    }
    Ok(conversion)
}

/// Totals a trip file and reviews its allocation.
pub fn breakdown(
    app: &App,
    trip: TripFile,
    base: Option<CurrencyCode>,
) -> AppResult<BreakdownReport> {
    let configured = &app.config().budget.categories;
    for entry in &trip.entries {
        if !configured.iter().any(|name| name.eq_ignore_ascii_case(entry.category.as_str())) {
            warn!(category = %entry.category, "Category is not in the configured list");
        }
    }

    let model = app.budget_model(base.or(trip.base_currency))?;
    let budget = model.add_entries(trip.entries)?;

    if budget.has_stale_rates() {
        let currencies: Vec<&str> =
            budget.stale_currencies.iter().map(CurrencyCode::as_str).collect();
        warn!(
            currencies = %currencies.join(","),
            "Totals use stale rates for some currencies"
        );
    }
    for diagnostic in &budget.diagnostics {
        warn!(
            entry_id = %diagnostic.entry_id,
            reason = %diagnostic.reason,
            "Entry left out of the totals"
        );
    }

    let breakdown = BreakdownExporter::export(&budget);
    let warnings = BudgetPlanner::review_allocation(&budget.totals_by_category);

    Ok(BreakdownReport {
        budget,
        breakdown,
        warnings,
    })
}

/// Estimates a trip's cost, optionally in another currency.
pub fn estimate(
    app: &App,
    days: u32,
    travelers: u32,
    style: TravelStyle,
    currency: Option<CurrencyCode>,
) -> AppResult<EstimateReport> {
    let mut estimate = BudgetPlanner::estimate_trip_cost(days, travelers, style);
    if let Some(currency) = currency {
        estimate = estimate.convert_to(app.converter(), currency, app.max_age())?;
        if estimate.stale {
            warn!(%currency, "Estimate uses stale rates");
        }
    }

    Ok(EstimateReport {
        daily_budget: BudgetPlanner::daily_budget(estimate.total, days),
        per_person_budget: BudgetPlanner::per_person_budget(estimate.total, travelers),
        emergency_fund: BudgetPlanner::emergency_fund(
            estimate.total,
            DEFAULT_EMERGENCY_FUND_PERCENT,
        ),
        estimate,
    })
}

/// Lists the configured currencies with their names.
pub fn currencies(app: &App) -> Vec<CurrencyInfo> {
    app.converter()
        .supported()
        .iter()
        .map(|code| CurrencyInfo {
            code,
            name: currency_name(code),
        })
        .collect()
}
