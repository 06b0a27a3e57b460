//! Sequential trade chain
//!
//! Combines hops with the rotate-base rule:
//! - `A/B` then `B/C` multiplies into `A/C`
//! - `A/B` then `A/C` (shared base) divides into `B/C`

use rust_decimal::Decimal;

use super::Aggregator;
use crate::price::{Pair, PriceAggregate, TRADE};

/// Combine a running result with the next hop
///
/// Returns the resulting pair and price. Any zero operand, overflow or
/// division by zero yields a zero price.
pub(crate) fn rotate(current: &Pair, price: Decimal, next: &PriceAggregate) -> (Pair, Decimal) {
    if next.pair.base == current.base {
        let pair = Pair::new(current.quote.clone(), next.pair.quote.clone());
        (pair, checked_or_zero(next.price.checked_div(price), price, next.price))
    } else {
        let pair = Pair::new(current.base.clone(), next.pair.quote.clone());
        (pair, checked_or_zero(price.checked_mul(next.price), price, next.price))
    }
}

fn checked_or_zero(result: Option<Decimal>, left: Decimal, right: Decimal) -> Decimal {
    if left.is_zero() || right.is_zero() {
        return Decimal::ZERO;
    }
    result.unwrap_or(Decimal::ZERO)
}

/// Trade combinator over an ordered list of hops
#[derive(Debug, Default, Clone)]
pub struct TradeAggregator {
    /// Hops ingested so far, in order
    legs: Vec<PriceAggregate>,
    /// Accumulated pair and price
    current: Option<(Pair, Decimal)>,
}

impl TradeAggregator {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs ingested so far, in order
    pub fn pairs(&self) -> Vec<Pair> {
        self.legs.iter().map(|l| l.pair.clone()).collect()
    }

    /// Pair the chain currently resolves to
    pub fn resulting_pair(&self) -> Option<&Pair> {
        self.current.as_ref().map(|(pair, _)| pair)
    }
}

impl Aggregator for TradeAggregator {
    type Input = PriceAggregate;

    fn ingest(&mut self, next: PriceAggregate) {
        self.current = Some(match self.current.take() {
            None => (next.pair.clone(), next.price),
            Some((pair, price)) => rotate(&pair, price, &next),
        });
        self.legs.push(next);
    }

    fn aggregate(&mut self, pair: &Pair) -> Option<PriceAggregate> {
        let (current, price) = self.current.as_ref()?;
        if current != pair {
            return None;
        }

        let price = if self.legs.iter().any(|l| l.price.is_zero()) {
            Decimal::ZERO
        } else {
            *price
        };
        Some(PriceAggregate::node(pair.clone(), price, TRADE, self.legs.clone()))
    }
}
