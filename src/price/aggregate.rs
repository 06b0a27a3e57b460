//! Provenance tree of a computed price

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Pair, PricePoint};

/// Model name of a median reducer or median-combined model
pub const MEDIAN: &str = "median";
/// Model name of a cross-path median
pub const INDIRECT_MEDIAN: &str = "indirect-median";
/// Model name of a sequential trade chain
pub const TRADE: &str = "trade";
/// Model name of a multiplied reference chain
pub const MULTIPLY: &str = "*";
/// Model name of a divided reference chain
pub const DIVIDE: &str = "/";

/// A computed price together with the inputs that produced it
///
/// Leaves carry the exchange name as their model; inner nodes carry the name
/// of the combinator. A zero price means "no usable result".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAggregate {
    /// Resulting pair
    pub pair: Pair,
    /// Resulting price
    pub price: Decimal,
    /// Exchange name for leaves, combinator name otherwise
    pub model: String,
    /// Contributing inputs, in combination order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PriceAggregate>,
    /// Newest contributing timestamp
    pub timestamp: Option<DateTime<Utc>>,
}

impl PriceAggregate {
    /// Create an aggregate with no inputs yet
    pub fn empty(pair: Pair, model: impl Into<String>) -> Self {
        Self {
            pair,
            price: Decimal::ZERO,
            model: model.into(),
            children: vec![],
            timestamp: None,
        }
    }

    /// Create an inner node from its children
    ///
    /// The timestamp is the newest among the children.
    pub fn node(
        pair: Pair,
        price: Decimal,
        model: impl Into<String>,
        children: Vec<PriceAggregate>,
    ) -> Self {
        let timestamp = children.iter().filter_map(|c| c.timestamp).max();
        Self {
            pair,
            price,
            model: model.into(),
            children,
            timestamp,
        }
    }

    /// Whether this aggregate carries a usable price
    pub fn is_valid(&self) -> bool {
        !self.price.is_zero()
    }

    /// Number of leaves in the provenance tree
    pub fn leaf_count(&self) -> usize {
        if self.children.is_empty() {
            1
        } else {
            self.children.iter().map(|c| c.leaf_count()).sum()
        }
    }
}

impl From<&PricePoint> for PriceAggregate {
    fn from(point: &PricePoint) -> Self {
        Self {
            pair: point.pair.clone(),
            price: point.effective_price(),
            model: point.exchange.name.clone(),
            children: vec![],
            timestamp: Some(point.timestamp),
        }
    }
}
