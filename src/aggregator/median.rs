//! Time-windowed median over raw ticks
//!
//! Keeps the most recent tick per exchange for one pair. A tick is eligible
//! while it is newer than `newest - window`, where `newest` is the newest
//! timestamp ever ingested.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use super::{median, Aggregator};
use crate::price::{Pair, PriceAggregate, PricePoint, MEDIAN};

/// Median reducer for one pair
pub struct MedianAggregator {
    /// Pair this reducer accepts
    pair: Pair,
    /// Freshness window
    window: Duration,
    /// Newest timestamp seen
    newest: Option<DateTime<Utc>>,
    /// Latest tick per exchange name
    points: HashMap<String, PricePoint>,
    /// Last computed result
    cached: PriceAggregate,
    /// Whether `cached` is out of date
    dirty: bool,
}

impl MedianAggregator {
    /// Create a reducer for `pair` with the given freshness window
    pub fn new(pair: Pair, window: Duration) -> Self {
        Self {
            cached: PriceAggregate::empty(pair.clone(), MEDIAN),
            pair,
            window,
            newest: None,
            points: HashMap::new(),
            dirty: false,
        }
    }

    /// Pair this reducer accepts
    pub fn pair(&self) -> &Pair {
        &self.pair
    }

    /// Number of exchanges currently stored (including not yet purged stale ones)
    pub fn source_count(&self) -> usize {
        self.points.len()
    }

    fn cutoff(&self) -> Option<DateTime<Utc>> {
        self.newest.map(|newest| newest - self.window)
    }

    fn recompute(&mut self) {
        if let Some(cutoff) = self.cutoff() {
            self.points.retain(|_, p| p.timestamp > cutoff);
        }

        let mut survivors: Vec<&PricePoint> = self.points.values().collect();
        survivors.sort_by(|a, b| a.exchange.name.cmp(&b.exchange.name));

        let prices: Vec<_> = survivors.iter().map(|p| p.effective_price()).collect();
        let children = survivors.into_iter().map(PriceAggregate::from).collect();

        self.cached = PriceAggregate::node(self.pair.clone(), median(&prices), MEDIAN, children);
        self.dirty = false;
    }
}

impl Aggregator for MedianAggregator {
    type Input = PricePoint;

    fn ingest(&mut self, point: PricePoint) {
        if point.pair != self.pair || !point.is_valid() {
            return;
        }

        self.newest = Some(match self.newest {
            Some(newest) => newest.max(point.timestamp),
            None => point.timestamp,
        });

        if let Some(cutoff) = self.cutoff() {
            if point.timestamp <= cutoff {
                tracing::debug!(
                    pair = %self.pair,
                    exchange = %point.exchange.name,
                    "Dropping stale tick"
                );
                return;
            }
        }

        let replace = match self.points.get(&point.exchange.name) {
            Some(stored) => stored.timestamp < point.timestamp,
            None => true,
        };
        if replace {
            self.points.insert(point.exchange.name.clone(), point);
            self.dirty = true;
        }
    }

    fn aggregate(&mut self, pair: &Pair) -> Option<PriceAggregate> {
        if *pair != self.pair {
            return None;
        }
        if self.dirty {
            self.recompute();
        }
        Some(self.cached.clone())
    }
}
