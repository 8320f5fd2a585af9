//! Shared types, errors, and configuration for travelfx.
//!
//! This crate provides common types used across all other crates:
//! - Currency codes and money amounts with decimal precision
//! - Typed IDs for expense entries
//! - Application-wide error classification
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, BudgetConfig, RatesConfig};
pub use error::{AppError, AppResult, Severity};
pub use types::{CurrencyCode, CurrencyCodeError, EntryId, Money};
