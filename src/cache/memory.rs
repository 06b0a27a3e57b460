//! In-memory price cache

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use super::CacheGetter;
use crate::price::{ExchangePair, Pair, PriceAggregate, PricePoint};

/// Latest tick per (exchange, pair)
///
/// With a freshness window, a stored tick is only served while it is newer
/// than `newest - window`, where `newest` is the newest timestamp ingested
/// for the same pair on any exchange.
#[derive(Debug, Default, Clone)]
pub struct PriceCache {
    points: HashMap<ExchangePair, PricePoint>,
    /// Newest timestamp seen per pair
    newest: HashMap<Pair, DateTime<Utc>>,
    window: Option<Duration>,
}

impl PriceCache {
    /// Create an empty cache that never expires ticks
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache serving only ticks within `window`
    pub fn with_window(window: Duration) -> Self {
        Self {
            window: Some(window),
            ..Self::default()
        }
    }

    /// Freshness window, if any
    pub fn window(&self) -> Option<Duration> {
        self.window
    }

    /// Whether `point` is still inside the window of its pair
    fn is_fresh(&self, point: &PricePoint) -> bool {
        match (self.window, self.newest.get(&point.pair)) {
            (Some(window), Some(newest)) => point.timestamp > *newest - window,
            _ => true,
        }
    }

    /// Fresh stored tick for a market
    fn fresh(&self, exchange: &str, pair: &Pair) -> Option<&PricePoint> {
        self.points
            .get(&ExchangePair::new(exchange, pair.clone()))
            .filter(|point| {
                let fresh = self.is_fresh(point);
                if !fresh {
                    tracing::debug!(exchange, pair = %pair, "Ignoring stale tick");
                }
                fresh
            })
    }

    /// Store a tick if it is usable and newer than the stored one
    ///
    /// Returns true if the cache changed.
    pub fn ingest(&mut self, point: &PricePoint) -> bool {
        if !point.is_valid() {
            return false;
        }

        let newest = self
            .newest
            .entry(point.pair.clone())
            .or_insert(point.timestamp);
        *newest = (*newest).max(point.timestamp);

        let key = ExchangePair::new(point.exchange.name.clone(), point.pair.clone());
        match self.points.get(&key) {
            Some(stored) if stored.timestamp >= point.timestamp => false,
            _ => {
                self.points.insert(key, point.clone());
                true
            }
        }
    }

    /// Copy of the stored tick, if still fresh
    pub fn get_point(&self, exchange: &str, pair: &Pair) -> Option<PricePoint> {
        self.fresh(exchange, pair).cloned()
    }

    /// Number of stored markets
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether nothing has been stored yet
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl CacheGetter for PriceCache {
    fn get(&self, exchange: &str, pair: &Pair) -> Option<PriceAggregate> {
        self.fresh(exchange, pair).map(PriceAggregate::from)
    }
}
