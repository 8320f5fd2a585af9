//! Core engine for travelfx.
//!
//! This crate contains the budget and currency logic with ZERO network or
//! filesystem dependencies. Exchange rates come in through the
//! [`currency::RateSource`] trait, which the `travelfx-rates` crate
//! implements over HTTP.
//!
//! # Modules
//!
//! - `currency` - Rate tables, caching and conversion with banker's rounding
//! - `budget` - Trip budgets, category totals, breakdowns and estimates

pub mod budget;
pub mod currency;
