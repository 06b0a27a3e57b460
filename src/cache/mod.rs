//! Price cache
//!
//! Keeps the latest usable tick per (exchange, pair) and hands out copies.

mod memory;

pub use memory::PriceCache;

use crate::price::{Pair, PriceAggregate};

/// Read access to the freshest known price of a market
pub trait CacheGetter {
    /// Latest aggregate for `pair` on `exchange`, or `None` if never seen
    ///
    /// The returned value is an owned copy; mutating it never affects the cache.
    fn get(&self, exchange: &str, pair: &Pair) -> Option<PriceAggregate>;
}
