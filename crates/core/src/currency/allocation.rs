//! Amount allocation utilities using the Largest Remainder Method.
//!
//! Used wherever a rounded total has to be split into rounded parts that add
//! back up exactly, such as breakdown percentages and rescaled category
//! budgets.
//!
//! The Largest Remainder Method works by:
//! 1. Calculate exact shares
//! 2. Round each share toward zero
//! 3. Calculate the remainder (total - sum of rounded shares)
//! 4. Give one unit each to the shares with the largest fractional parts

use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Allocation utility for distributing amounts.
pub struct AllocationUtil;

impl AllocationUtil {
    /// Splits `total` proportionally to `weights`.
    ///
    /// The result has one share per weight and its sum equals `total`
    /// rounded to `decimal_places` (banker's rounding). Ties between equal
    /// remainders go to the earlier weight. If every weight is zero, every
    /// share is zero.
    ///
    /// `total` and all weights are expected to be non-negative.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use travelfx_core::currency::AllocationUtil;
    ///
    /// let shares = AllocationUtil::allocate_proportionally(dec!(100), &[dec!(1), dec!(1), dec!(1)], 2);
    /// assert_eq!(shares, vec![dec!(33.34), dec!(33.33), dec!(33.33)]);
    /// ```
    #[must_use]
    pub fn allocate_proportionally(
        total: Decimal,
        weights: &[Decimal],
        decimal_places: u32,
    ) -> Vec<Decimal> {
        if weights.is_empty() {
            return vec![];
        }

        let Some(ratios) = Self::proportions(weights) else {
            return vec![Decimal::ZERO; weights.len()];
        };

        let unit = Decimal::new(1, decimal_places);
        let total_rounded =
            total.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven);

        // Ratios are at most one, so no share exceeds the total.
        let exact: Vec<Decimal> = ratios.iter().map(|r| *r * total_rounded).collect();

        let mut rounded: Vec<Decimal> = exact
            .iter()
            .map(|a| a.round_dp_with_strategy(decimal_places, RoundingStrategy::ToZero))
            .collect();

        let sum_rounded = rounded
            .iter()
            .try_fold(Decimal::ZERO, |acc, r| acc.checked_add(*r))
            .unwrap_or(total_rounded);
        let units_to_distribute = ((total_rounded - sum_rounded) / unit)
            .round_dp_with_strategy(0, RoundingStrategy::ToZero)
            .to_usize()
            .unwrap_or(0);

        if units_to_distribute == 0 {
            return rounded;
        }

        let mut remainders: Vec<(usize, Decimal)> = exact
            .iter()
            .zip(rounded.iter())
            .enumerate()
            .map(|(i, (e, r))| (i, *e - *r))
            .collect();

        // Stable sort keeps index order among equal remainders.
        remainders.sort_by(|a, b| b.1.cmp(&a.1));

        for (idx, _) in remainders.iter().take(units_to_distribute) {
            rounded[*idx] += unit;
        }

        rounded
    }

    /// Each weight's fraction of the sum of `weights`.
    ///
    /// Returns `None` when the weights sum to zero. Weights too large to sum
    /// are first scaled down by twice their count, which leaves the fractions
    /// unchanged.
    #[must_use]
    pub fn proportions(weights: &[Decimal]) -> Option<Vec<Decimal>> {
        let sum_of = |values: &[Decimal]| {
            values
                .iter()
                .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
        };

        let (values, sum) = match sum_of(weights) {
            Some(sum) => (weights.to_vec(), sum),
            None => {
                let divisor = Decimal::from(weights.len()) * Decimal::TWO;
                let scaled: Vec<Decimal> = weights.iter().map(|w| *w / divisor).collect();
                let sum = sum_of(&scaled).unwrap_or(Decimal::MAX);
                (scaled, sum)
            }
        };

        if sum.is_zero() {
            return None;
        }
        Some(values.iter().map(|v| *v / sum).collect())
    }
}
