//! Price combinators
//!
//! Every combinator ingests inputs and produces a [`PriceAggregate`] for the
//! pair it was built for:
//! - [`MedianAggregator`]: windowed consensus over raw ticks of one pair
//! - [`TradeAggregator`]: sequential multiply/divide across hops
//! - [`IndirectAggregator`]: median across alternative trade results
//! - [`PathAggregator`]: direct reducers per pair feeding trades per path

mod indirect;
mod median;
mod path;
mod trade;

pub use indirect::IndirectAggregator;
pub use median::MedianAggregator;
pub use path::{PathAggregator, ReducerFactory};
pub use trade::TradeAggregator;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::price::{Pair, PriceAggregate};

/// Common interface of all combinators
pub trait Aggregator: Send {
    /// Input accepted by this combinator
    type Input;

    /// Feed one input
    fn ingest(&mut self, input: Self::Input);

    /// Current result for `pair`
    ///
    /// `None` when this combinator does not produce `pair`. The result is an
    /// owned copy.
    fn aggregate(&mut self, pair: &Pair) -> Option<PriceAggregate>;
}

/// Order-statistic median
///
/// Values are sorted descending. An odd count takes the middle element; an
/// even count takes the mean of the two middle elements truncated toward zero
/// at the larger significant scale of the two (trailing zeros ignored), which
/// for integral prices is truncating integer division. The result depends only
/// on the values, never on how they are written. An empty input yields zero.
pub fn median(prices: &[Decimal]) -> Decimal {
    if prices.is_empty() {
        return Decimal::ZERO;
    }

    let mut sorted = prices.to_vec();
    sorted.sort_by(|a, b| b.cmp(a));

    let n = sorted.len();
    if n % 2 == 1 {
        return sorted[n / 2];
    }

    let (a, b) = (sorted[n / 2 - 1], sorted[n / 2]);
    let scale = significant_scale(a).max(significant_scale(b));
    let mean = match a.checked_add(b) {
        Some(sum) => sum / Decimal::TWO,
        None => a / Decimal::TWO + b / Decimal::TWO,
    };
    mean.round_dp_with_strategy(scale, RoundingStrategy::ToZero)
}

/// Fractional digits of `value` without trailing zeros
fn significant_scale(value: Decimal) -> u32 {
    value.normalize().scale()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_median_empty() {
        assert_eq!(median(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_median_single() {
        assert_eq!(median(&[dec!(42)]), dec!(42));
    }

    #[test]
    fn test_median_odd() {
        assert_eq!(median(&[dec!(20), dec!(3), dec!(10)]), dec!(10));
    }

    #[test]
    fn test_median_even_truncates() {
        assert_eq!(median(&[dec!(30), dec!(9)]), dec!(19));
        assert_eq!(median(&[dec!(2), dec!(4)]), dec!(3));
        assert_eq!(median(&[dec!(1), dec!(2), dec!(3), dec!(4)]), dec!(2));
    }

    #[test]
    fn test_median_even_keeps_operand_scale() {
        assert_eq!(median(&[dec!(0.05), dec!(0.06)]), dec!(0.05));
        assert_eq!(median(&[dec!(0.050), dec!(0.061)]), dec!(0.055));
    }

    #[test]
    fn test_median_ignores_trailing_zeros() {
        assert_eq!(dec!(100), dec!(100.00));
        assert_eq!(median(&[dec!(100), dec!(101)]), dec!(100));
        assert_eq!(median(&[dec!(100.00), dec!(101.00)]), dec!(100));
        assert_eq!(median(&[dec!(100.0000), dec!(101)]), dec!(100));
        assert_eq!(median(&[dec!(0.0500), dec!(0.0610)]), dec!(0.055));
    }

    #[test]
    fn test_median_of_products_matches_plain_values() {
        // Multiplied legs carry the scale of both factors
        let product = dec!(3.00) * dec!(10.00);
        assert_eq!(product.scale(), 4);
        assert_eq!(median(&[product, dec!(9)]), median(&[dec!(30), dec!(9)]));
        assert_eq!(median(&[product, dec!(9)]), dec!(19));
    }

    #[test]
    fn test_median_order_independent() {
        let a = median(&[dec!(5), dec!(1), dec!(9), dec!(7)]);
        let b = median(&[dec!(9), dec!(7), dec!(5), dec!(1)]);
        assert_eq!(a, b);
        assert_eq!(a, dec!(6));
    }
}
