//! Chart-ready budget breakdowns.

use rust_decimal::Decimal;

use super::types::{BreakdownItem, BudgetBreakdown, Priority, TripBudget};
use crate::currency::{AllocationUtil, MONEY_DECIMAL_PLACES};

/// Turns budget snapshots into percentage breakdowns.
pub struct BreakdownExporter;

impl BreakdownExporter {
    /// Builds a breakdown from a snapshot.
    ///
    /// Percentages are apportioned with the largest remainder method so
    /// they add up to exactly 100.00. A zero grand total yields 0% for
    /// every category rather than dividing by zero.
    #[must_use]
    pub fn export(budget: &TripBudget) -> BudgetBreakdown {
        let amounts: Vec<Decimal> = budget
            .totals_by_category
            .iter()
            .map(|total| total.amount)
            .collect();

        let percentages = if budget.grand_total.is_zero() {
            vec![Decimal::ZERO; amounts.len()]
        } else {
            AllocationUtil::allocate_proportionally(
                Decimal::ONE_HUNDRED,
                &amounts,
                MONEY_DECIMAL_PLACES,
            )
        };

        let items = budget
            .totals_by_category
            .iter()
            .zip(percentages)
            .map(|(total, percentage)| BreakdownItem {
                category: total.category.clone(),
                amount: total.amount,
                percentage,
                priority: Priority::from_percentage(percentage),
            })
            .collect();

        BudgetBreakdown {
            base_currency: budget.base_currency,
            grand_total: budget.grand_total,
            items,
            stale_rates: budget.has_stale_rates(),
        }
    }
}
