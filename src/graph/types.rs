//! Price model graph types

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::price::Pair;

/// Origin text meaning "resolve through the model map"
pub const MODEL_ORIGIN: &str = ".";

/// Where a reference reads its price from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Origin {
    /// Latest cached tick of this exchange
    Exchange(String),
    /// The pair's own price model
    Model,
}

impl Origin {
    /// Parse the document form, where `"."` means the model map
    pub fn parse(origin: &str) -> Self {
        if origin == MODEL_ORIGIN {
            Origin::Model
        } else {
            Origin::Exchange(origin.to_string())
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Exchange(name) => f.write_str(name),
            Origin::Model => f.write_str(MODEL_ORIGIN),
        }
    }
}

/// How a reference combines with the one chained after it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operator {
    /// Keep the left value, ignore the rest of the chain
    Noop,
    /// `A/B * B/C = A/C`
    Multiply,
    /// `A/C / A/B = B/C`
    Divide,
}

/// A chained reference and the operator joining it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub operator: Operator,
    pub target: PriceRef,
}

/// Reference to a price, optionally chained to further references
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceRef {
    pub origin: Origin,
    pub pair: Pair,
    pub next: Option<Box<Link>>,
}

impl PriceRef {
    /// Reference to an exchange's cached tick
    pub fn exchange(name: impl Into<String>, pair: Pair) -> Self {
        Self {
            origin: Origin::Exchange(name.into()),
            pair,
            next: None,
        }
    }

    /// Reference to a pair's price model
    pub fn model(pair: Pair) -> Self {
        Self {
            origin: Origin::Model,
            pair,
            next: None,
        }
    }

    /// Append `target` to the end of this chain
    pub fn then(mut self, operator: Operator, target: PriceRef) -> Self {
        self.push(operator, target);
        self
    }

    fn push(&mut self, operator: Operator, target: PriceRef) {
        match self.next.as_mut() {
            Some(link) => link.target.push(operator, target),
            None => self.next = Some(Box::new(Link { operator, target })),
        }
    }

    /// Every hop taking part in evaluation, with the operator joining it to
    /// its predecessor. A `Noop` link ends the chain.
    pub fn hops(&self) -> Vec<(Option<Operator>, &PriceRef)> {
        let mut hops = vec![(None, self)];
        let mut link = self.next.as_deref();
        while let Some(l) = link {
            if l.operator == Operator::Noop {
                break;
            }
            hops.push((Some(l.operator), &l.target));
            link = l.target.next.as_deref();
        }
        hops
    }
}

/// Aggregation method of a price model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Method {
    Median,
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "median" => Ok(Method::Median),
            other => Err(other.to_string()),
        }
    }
}

/// How one pair is priced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceModel {
    /// Combination method
    pub method: Method,
    /// Quorum of resolved chains
    pub min_sources: usize,
    /// Alternative source chains
    pub sources: Vec<PriceRef>,
}

/// Configuration errors, raised while loading
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Pair text is not `BASE/QUOTE`
    #[error("Invalid pair {0:?}")]
    InvalidPair(String),
    /// Method other than median
    #[error("Unsupported method {method:?} for {pair}")]
    UnsupportedMethod { pair: Pair, method: String },
    /// Model without source chains
    #[error("No sources configured for {0}")]
    NoSources(Pair),
    /// Source chain without hops
    #[error("Empty source chain for {0}")]
    EmptyChain(Pair),
    /// Quorum of zero or above the number of chains
    #[error("minSources {min} invalid for {pair} with {available} sources")]
    InvalidMinSources {
        pair: Pair,
        min: usize,
        available: usize,
    },
    /// Hop that does not connect to the running result
    #[error("Hop {hop} does not connect to {from} in chain for {target}")]
    DisconnectedHop { target: Pair, from: Pair, hop: Pair },
    /// Chain that ends at a different pair than its model
    #[error("Chain for {target} produces {produced}")]
    ChainMismatch { target: Pair, produced: Pair },
    /// Reference to a pair without a model
    #[error("{pair} references missing model {reference}")]
    UnknownModel { pair: Pair, reference: Pair },
    /// Self-referential model graph
    #[error("Cyclic price models: {}", format_cycle(.0))]
    Cycle(Vec<Pair>),
}

fn format_cycle(cycle: &[Pair]) -> String {
    cycle
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Reasons a resolution produced no result
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Pair has no model
    #[error("No price model for {0}")]
    NotFound(Pair),
    /// Quorum not met
    #[error("Only {resolved} of {required} required sources resolved for {pair}")]
    InsufficientSources {
        pair: Pair,
        resolved: usize,
        required: usize,
    },
    /// Exchange never reported the pair
    #[error("No tick from {exchange} for {pair}")]
    MissingTick { exchange: String, pair: Pair },
    /// Zero, overflowed or undefined price
    #[error("No usable price for {0}")]
    ZeroPrice(Pair),
}

impl ResolveError {
    /// Short label for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            ResolveError::NotFound(_) => "not_found",
            ResolveError::InsufficientSources { .. } => "insufficient_sources",
            ResolveError::MissingTick { .. } => "missing_tick",
            ResolveError::ZeroPrice(_) => "zero_price",
        }
    }
}
