//! Price data model
//!
//! Pairs, exchanges, raw ticks and the provenance tree every combinator
//! produces.

mod aggregate;
mod pair;
mod point;

pub use aggregate::{PriceAggregate, DIVIDE, INDIRECT_MEDIAN, MEDIAN, MULTIPLY, TRADE};
pub use pair::{Exchange, ExchangePair, Pair};
pub use point::PricePoint;

use thiserror::Error;

/// Pair parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PairError {
    /// Text is not of the form `BASE/QUOTE`
    #[error("Malformed pair {0:?}, expected BASE/QUOTE")]
    Malformed(String),
}
