//! Trip budgets, category totals and breakdowns.

pub mod aggregator;
pub mod breakdown;
pub mod error;
pub mod model;
pub mod planner;
pub mod types;


pub use aggregator::BudgetAggregator;
pub use breakdown::BreakdownExporter;
pub use error::BudgetError;
pub use model::TripBudgetModel;
pub use planner::{
    BudgetPlanner, BudgetWarning, DEFAULT_EMERGENCY_FUND_PERCENT, TravelStyle, TripEstimate,
};
pub use types::{
    BreakdownItem, BudgetBreakdown, BudgetSettings, Category, CategoryTotal, EntryDiagnostic,
    ExpenseEntry, Priority, RecomputeMode, TripBudget,
};
