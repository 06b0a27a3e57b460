//! Raw exchange observations

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Exchange, Pair};

/// One timestamped observation from one exchange for one pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Observation time
    pub timestamp: DateTime<Utc>,
    /// Source exchange
    pub exchange: Exchange,
    /// Observed market
    pub pair: Pair,
    /// Best ask
    #[serde(default)]
    pub ask: Decimal,
    /// Best bid
    #[serde(default)]
    pub bid: Decimal,
    /// Last trade price
    #[serde(default)]
    pub price: Decimal,
    /// Traded volume
    #[serde(default)]
    pub volume: Decimal,
}

impl PricePoint {
    /// Create a point carrying only a last-trade price
    pub fn new(
        timestamp: DateTime<Utc>,
        exchange: Exchange,
        pair: Pair,
        price: Decimal,
    ) -> Self {
        Self {
            timestamp,
            exchange,
            pair,
            ask: Decimal::ZERO,
            bid: Decimal::ZERO,
            price,
            volume: Decimal::ZERO,
        }
    }

    /// Set the top of book
    pub fn with_quotes(mut self, ask: Decimal, bid: Decimal) -> Self {
        self.ask = ask;
        self.bid = bid;
        self
    }

    /// Usable scalar price of this observation
    ///
    /// Mid of ask and bid when both are present, otherwise the last trade.
    /// Zero means the point carries no usable price.
    pub fn effective_price(&self) -> Decimal {
        if !self.ask.is_zero() && !self.bid.is_zero() {
            return (self.ask + self.bid) / Decimal::TWO;
        }
        if !self.price.is_zero() {
            return self.price;
        }
        Decimal::ZERO
    }

    /// Whether the point can take part in aggregation
    pub fn is_valid(&self) -> bool {
        !self.effective_price().is_zero()
    }
}
