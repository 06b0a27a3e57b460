//! Path orchestrator
//!
//! Owns one direct reducer per observed pair. Aggregating a target builds a
//! fresh trade chain per configured alternative from the reducers' current
//! results and takes the cross-path median. Nothing is cached between calls.

use std::collections::HashMap;

use super::{Aggregator, IndirectAggregator, TradeAggregator};
use crate::pather::Pather;
use crate::price::{Pair, PriceAggregate, PricePoint};

/// Builds the direct reducer for a newly observed pair
pub type ReducerFactory = Box<dyn Fn(&Pair) -> Box<dyn Aggregator<Input = PricePoint>> + Send>;

/// Path-table driven aggregator
pub struct PathAggregator<P: Pather> {
    pather: P,
    factory: ReducerFactory,
    reducers: HashMap<Pair, Box<dyn Aggregator<Input = PricePoint>>>,
}

impl<P: Pather> PathAggregator<P> {
    /// Create an orchestrator over `pather`, building reducers with `factory`
    pub fn new(pather: P, factory: ReducerFactory) -> Self {
        Self {
            pather,
            factory,
            reducers: HashMap::new(),
        }
    }

    /// Path provider
    pub fn pather(&self) -> &P {
        &self.pather
    }

    /// Number of pairs with a direct reducer
    pub fn reducer_count(&self) -> usize {
        self.reducers.len()
    }

    /// Run one alternative through a trade chain
    fn trade(&mut self, target: &Pair, hops: &[Pair]) -> Option<PriceAggregate> {
        let mut trade = TradeAggregator::new();
        for hop in hops {
            let reducer = self.reducers.get_mut(hop)?;
            trade.ingest(reducer.aggregate(hop)?);
        }
        trade.aggregate(target)
    }
}

impl<P: Pather> Aggregator for PathAggregator<P> {
    type Input = PricePoint;

    fn ingest(&mut self, point: PricePoint) {
        let factory = &self.factory;
        self.reducers
            .entry(point.pair.clone())
            .or_insert_with(|| factory(&point.pair))
            .ingest(point);
    }

    fn aggregate(&mut self, target: &Pair) -> Option<PriceAggregate> {
        let paths = self.pather.paths(target)?;

        let mut indirect = IndirectAggregator::new(target.clone());
        for hops in &paths.paths {
            match self.trade(target, hops) {
                Some(result) => indirect.ingest(result),
                None => tracing::debug!(
                    target = %target,
                    hops = hops.len(),
                    "Path has no reducer data, skipping"
                ),
            }
        }

        indirect.aggregate(target)
    }
}
