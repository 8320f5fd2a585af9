//! Property-based tests for currency operations.
//!
//! - Identity conversion preserves the amount exactly
//! - Conversion there and back stays within rounding tolerance
//! - Converted amounts carry at most 2 decimal places and are never negative
//! - Proportional allocation always sums to the rounded total

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::allocation::AllocationUtil;
use super::cache::RateCache;
use super::conversion::round_money;
use super::registry::SupportedCurrencies;
use super::service::CurrencyConverter;
use super::testing::{ManualClock, StaticRateSource, code};

const HOUR: Duration = Duration::from_secs(3600);

/// Strategy to generate non-negative amounts (0.00 to 1,000,000.00).
fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate amounts with up to 6 decimal places.
fn precise_amount() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000_000_000i64).prop_map(|v| Decimal::new(v, 6))
}

/// Strategy to generate positive exchange rates (0.0001 to 10000.0000).
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

/// Strategy to generate allocation weights (0.00 to 10,000.00).
fn weights() -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec((0i64..1_000_000i64).prop_map(|v| Decimal::new(v, 2)), 1..12)
}

/// Converter whose USD table quotes EUR at `rate` and whose EUR table is
/// empty, so EUR -> USD goes through the inverse path.
fn converter(rate: Decimal) -> CurrencyConverter {
    let source = Arc::new(StaticRateSource::new().with_rates("USD", &[("EUR", rate)]));
    let cache = Arc::new(RateCache::with_clock(source, Arc::new(ManualClock::new())));
    CurrencyConverter::new(cache, SupportedCurrencies::default())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* amount >= 0, converting a currency to itself returns the
    /// amount exactly, without rounding.
    #[test]
    fn prop_identity_conversion_is_exact(amount in precise_amount(), rate in positive_rate()) {
        let converter = converter(rate);
        let result = converter.convert(amount, code("USD"), code("USD"), HOUR).unwrap();
        prop_assert_eq!(result.converted.amount, amount);
    }

    /// *For any* amount and rate, the converted amount has at most 2 decimal
    /// places and is non-negative.
    #[test]
    fn prop_converted_amount_is_cents(amount in amount(), rate in positive_rate()) {
        let converter = converter(rate);
        let result = converter.convert(amount, code("USD"), code("EUR"), HOUR).unwrap();
        let converted = result.converted.amount;
        prop_assert_eq!(converted, round_money(converted));
        prop_assert!(converted >= Decimal::ZERO);
    }

    /// *For any* amount and rate r, converting USD -> EUR -> USD differs
    /// from the original by at most the two rounding steps:
    /// 0.005 / r (first rounding, scaled back) + 0.005 (second rounding).
    #[test]
    fn prop_round_trip_within_tolerance(amount in amount(), rate in positive_rate()) {
        let converter = converter(rate);
        let there = converter.convert(amount, code("USD"), code("EUR"), HOUR).unwrap();
        let back = converter
            .convert(there.converted.amount, code("EUR"), code("USD"), HOUR)
            .unwrap();

        let tolerance = dec!(0.005) / rate + dec!(0.005) + dec!(0.000001);
        let drift = (back.converted.amount - amount).abs();
        prop_assert!(
            drift <= tolerance,
            "round trip drifted by {} (tolerance {}) for amount {} at rate {}",
            drift, tolerance, amount, rate
        );
    }

    /// *For any* total and weights, the allocated shares sum exactly to the
    /// total rounded to 2 decimal places (or zero when all weights are zero).
    #[test]
    fn prop_allocation_sum_invariant(total in amount(), weights in weights()) {
        let shares = AllocationUtil::allocate_proportionally(total, &weights, 2);
        prop_assert_eq!(shares.len(), weights.len());

        let sum: Decimal = shares.iter().copied().sum();
        if weights.iter().all(Decimal::is_zero) {
            prop_assert_eq!(sum, Decimal::ZERO);
        } else {
            prop_assert_eq!(sum, round_money(total));
        }
    }

    /// *For any* total, equal weights get shares within one cent of each other.
    #[test]
    fn prop_equal_weights_are_fair(total in amount(), count in 1usize..20) {
        let shares = AllocationUtil::allocate_proportionally(total, &vec![Decimal::ONE; count], 2);
        let max = shares.iter().copied().max().unwrap();
        let min = shares.iter().copied().min().unwrap();
        prop_assert!(max - min <= dec!(0.01));
    }
}
