//! Trip cost estimates and allocation advice.

use std::fmt;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use travelfx_shared::CurrencyCode;

use super::types::{Category, CategoryTotal};
use crate::currency::{
    AllocationUtil, CurrencyConverter, CurrencyError, MONEY_DECIMAL_PLACES, checked_total,
    round_money,
};

/// Default share of the total set aside for emergencies, in percent.
pub const DEFAULT_EMERGENCY_FUND_PERCENT: Decimal = Decimal::from_parts(15, 0, 0, false, 0);

const MIN_EMERGENCY_SHARE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);
const MAX_LODGING_SHARE: Decimal = Decimal::from_parts(5, 0, 0, false, 1);
const MAX_CATEGORY_SHARE: Decimal = Decimal::from_parts(6, 0, 0, false, 1);

/// Category holding lodging costs.
pub const LODGING: &str = "lodging";

/// Category holding the emergency reserve.
pub const EMERGENCY: &str = "emergency";

/// How comfortably the traveler wants to travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelStyle {
    /// Hostels, street food, public transport.
    Budget,
    /// Mid-range hotels and restaurants.
    #[default]
    Moderate,
    /// High-end everything.
    Luxury,
}

impl TravelStyle {
    /// Per-person daily cost in USD for each estimated category.
    #[must_use]
    pub fn daily_rates(self) -> [(&'static str, Decimal); 5] {
        let [lodging, food, transport, activities, misc]: [u32; 5] = match self {
            Self::Budget => [30, 20, 10, 15, 10],
            Self::Moderate => [80, 50, 30, 40, 25],
            Self::Luxury => [200, 100, 80, 100, 50],
        };
        [
            (LODGING, Decimal::from(lodging)),
            ("food", Decimal::from(food)),
            ("transport", Decimal::from(transport)),
            ("activities", Decimal::from(activities)),
            ("misc", Decimal::from(misc)),
        ]
    }
}

impl fmt::Display for TravelStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Budget => "budget",
            Self::Moderate => "moderate",
            Self::Luxury => "luxury",
        })
    }
}

/// Estimated cost of a whole trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripEstimate {
    /// Currency of all amounts.
    pub currency: CurrencyCode,
    /// Style the estimate was made for.
    pub style: TravelStyle,
    /// Trip length.
    pub days: u32,
    /// Party size.
    pub travelers: u32,
    /// Per-category estimates.
    pub items: Vec<CategoryTotal>,
    /// Sum of `items`.
    pub total: Decimal,
    /// True if a conversion used stale rates.
    pub stale: bool,
}

impl TripEstimate {
    /// Re-expresses the estimate in `currency`.
    ///
    /// Each item is converted and rounded on its own; the total is the sum
    /// of the converted items.
    ///
    /// # Errors
    ///
    /// Any conversion error for the pair, or `InvalidAmount` if the
    /// converted total does not fit a `Decimal`.
    pub fn convert_to(
        &self,
        converter: &CurrencyConverter,
        currency: CurrencyCode,
        max_age: Duration,
    ) -> Result<Self, CurrencyError> {
        let mut stale = self.stale;
        let items = self
            .items
            .iter()
            .map(|item| -> Result<CategoryTotal, CurrencyError> {
                let conversion = converter.convert(item.amount, self.currency, currency, max_age)?;
                stale |= conversion.stale;
                Ok(CategoryTotal {
                    category: item.category.clone(),
                    amount: conversion.converted.amount,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            currency,
            style: self.style,
            days: self.days,
            travelers: self.travelers,
            total: checked_total(items.iter().map(|item| item.amount))?,
            items,
            stale,
        })
    }
}

/// A finding from [`BudgetPlanner::review_allocation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BudgetWarning {
    /// Nothing has been allocated yet.
    ZeroTotal,
    /// Emergency reserve below 5% of the total.
    LowEmergencyFund {
        /// Current share in percent.
        percentage: Decimal,
    },
    /// Lodging above 50% of the total.
    LodgingHeavy {
        /// Current share in percent.
        percentage: Decimal,
    },
    /// A single category above 60% of the total.
    DominantCategory {
        /// The category.
        category: Category,
        /// Current share in percent.
        percentage: Decimal,
    },
}

impl fmt::Display for BudgetWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroTotal => write!(f, "Total budget is zero, add some budget items"),
            Self::LowEmergencyFund { percentage } => write!(
                f,
                "Emergency fund is {percentage}% of the total, less than 5%"
            ),
            Self::LodgingHeavy { percentage } => write!(
                f,
                "Lodging is {percentage}% of the total, consider cheaper alternatives"
            ),
            Self::DominantCategory {
                category,
                percentage,
            } => write!(f, "{category} is {percentage}% of the total, more than 60%"),
        }
    }
}

/// Planning helpers for trip budgets.
pub struct BudgetPlanner;

impl BudgetPlanner {
    /// Estimates a trip's cost in USD from daily per-person rates.
    #[must_use]
    pub fn estimate_trip_cost(days: u32, travelers: u32, style: TravelStyle) -> TripEstimate {
        let person_days = Decimal::from(days) * Decimal::from(travelers);
        let items: Vec<CategoryTotal> = style
            .daily_rates()
            .into_iter()
            .map(|(name, daily)| CategoryTotal {
                category: Category::builtin(name),
                amount: daily * person_days,
            })
            .collect();

        TripEstimate {
            currency: CurrencyCode::USD,
            style,
            days,
            travelers,
            total: items.iter().map(|item| item.amount).sum(),
            items,
            stale: false,
        }
    }

    /// Budget per day, zero for a zero-day trip.
    #[must_use]
    pub fn daily_budget(total: Decimal, days: u32) -> Decimal {
        divide_or_zero(total, days)
    }

    /// Budget per traveler, zero for an empty party.
    #[must_use]
    pub fn per_person_budget(total: Decimal, travelers: u32) -> Decimal {
        divide_or_zero(total, travelers)
    }

    /// Amount to set aside for emergencies.
    ///
    /// `percent` is typically [`DEFAULT_EMERGENCY_FUND_PERCENT`] and is
    /// clamped to 0..=100.
    #[must_use]
    pub fn emergency_fund(total: Decimal, percent: Decimal) -> Decimal {
        let percent = percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
        round_money(total * (percent / Decimal::ONE_HUNDRED))
    }

    /// Scales category totals so they sum to `target` while keeping their
    /// proportions.
    ///
    /// Totals that sum to zero have no proportions and are returned as-is.
    #[must_use]
    pub fn rescale_to_target(totals: &[CategoryTotal], target: Decimal) -> Vec<CategoryTotal> {
        let amounts: Vec<Decimal> = totals.iter().map(|total| total.amount).collect();
        if AllocationUtil::proportions(&amounts).is_none() {
            return totals.to_vec();
        }

        let shares = AllocationUtil::allocate_proportionally(target, &amounts, MONEY_DECIMAL_PLACES);
        totals
            .iter()
            .zip(shares)
            .map(|(total, amount)| CategoryTotal {
                category: total.category.clone(),
                amount,
            })
            .collect()
    }

    /// General-purpose allocation in percent per category.
    #[must_use]
    pub fn recommended_allocation() -> Vec<CategoryTotal> {
        [
            (LODGING, 30),
            ("food", 25),
            ("transport", 20),
            ("activities", 15),
            (EMERGENCY, 5),
            ("shopping", 3),
            ("entertainment", 2),
            ("misc", 0),
        ]
        .into_iter()
        .map(|(name, percent)| CategoryTotal {
            category: Category::builtin(name),
            amount: Decimal::from(percent),
        })
        .collect()
    }

    /// Flags allocations that look risky.
    #[must_use]
    pub fn review_allocation(totals: &[CategoryTotal]) -> Vec<BudgetWarning> {
        let amounts: Vec<Decimal> = totals.iter().map(|t| t.amount).collect();
        let Some(shares) = AllocationUtil::proportions(&amounts) else {
            return vec![BudgetWarning::ZeroTotal];
        };

        let percentage = |share: Decimal| round_money(share * Decimal::ONE_HUNDRED);
        let share_of = |name: &str| {
            totals
                .iter()
                .zip(&shares)
                .filter(|(t, _)| t.category.as_str() == name)
                .map(|(_, share)| *share)
                .sum::<Decimal>()
        };

        let mut warnings = Vec::new();

        let emergency = share_of(EMERGENCY);
        if emergency < MIN_EMERGENCY_SHARE {
            warnings.push(BudgetWarning::LowEmergencyFund {
                percentage: percentage(emergency),
            });
        }

        let lodging = share_of(LODGING);
        if lodging > MAX_LODGING_SHARE {
            warnings.push(BudgetWarning::LodgingHeavy {
                percentage: percentage(lodging),
            });
        }

        for (item, share) in totals.iter().zip(&shares) {
            if *share > MAX_CATEGORY_SHARE {
                warnings.push(BudgetWarning::DominantCategory {
                    category: item.category.clone(),
                    percentage: percentage(*share),
                });
            }
        }

        warnings
    }
}

fn divide_or_zero(total: Decimal, divisor: u32) -> Decimal {
    if divisor == 0 {
        Decimal::ZERO
    } else {
        round_money(total / Decimal::from(divisor))
    }
}
