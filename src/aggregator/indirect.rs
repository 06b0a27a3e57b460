//! Cross-path median

use super::{median, Aggregator};
use crate::price::{Pair, PriceAggregate, INDIRECT_MEDIAN};

/// Median across already-resolved alternatives for one target pair
///
/// No de-duplication and no freshness filtering happen here; each input
/// already carries its own provenance. Zero-priced inputs are skipped.
pub struct IndirectAggregator {
    pair: Pair,
    inputs: Vec<PriceAggregate>,
}

impl IndirectAggregator {
    /// Create a combinator for `pair`
    pub fn new(pair: Pair) -> Self {
        Self {
            pair,
            inputs: vec![],
        }
    }

    /// Number of accepted inputs
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Whether no input has been accepted
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

impl Aggregator for IndirectAggregator {
    type Input = PriceAggregate;

    fn ingest(&mut self, input: PriceAggregate) {
        if input.pair == self.pair {
            self.inputs.push(input);
        }
    }

    fn aggregate(&mut self, pair: &Pair) -> Option<PriceAggregate> {
        if *pair != self.pair {
            return None;
        }

        let usable: Vec<PriceAggregate> = self
            .inputs
            .iter()
            .filter(|i| i.is_valid())
            .cloned()
            .collect();
        let prices: Vec<_> = usable.iter().map(|i| i.price).collect();

        Some(PriceAggregate::node(
            pair.clone(),
            median(&prices),
            INDIRECT_MEDIAN,
            usable,
        ))
    }
}
