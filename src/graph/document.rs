//! JSON price-model document
//!
//! ```json
//! {
//!   "ETH/USD": {
//!     "method": "median",
//!     "minSources": 1,
//!     "sources": [
//!       [{"origin": "kraken"}],
//!       [{"origin": "binance", "pair": "ETH/BTC"}, {"origin": ".", "pair": "BTC/USD"}]
//!     ]
//!   }
//! }
//! ```
//!
//! A hop without `pair` prices the model's own pair. Operators between hops
//! follow the trade rule: a hop sharing the running result's base divides,
//! any other hop multiplies.

use serde::Deserialize;
use std::collections::BTreeMap;

use super::types::{Method, ModelError, Operator, Origin, PriceModel, PriceRef};
use crate::price::Pair;

#[derive(Debug, Deserialize)]
pub(crate) struct RawModel {
    method: String,
    #[serde(rename = "minSources", default = "default_min_sources")]
    min_sources: usize,
    sources: Vec<Vec<RawHop>>,
}

#[derive(Debug, Deserialize)]
struct RawHop {
    origin: String,
    #[serde(default)]
    pair: Option<String>,
}

fn default_min_sources() -> usize {
    1
}

/// Document as written on disk
pub(crate) type RawDocument = BTreeMap<String, RawModel>;

/// Convert a raw document into typed models, without graph validation
pub(crate) fn convert(document: RawDocument) -> Result<BTreeMap<Pair, PriceModel>, ModelError> {
    let mut models = BTreeMap::new();

    for (key, raw) in document {
        let pair = parse_pair(&key)?;
        let method: Method = raw
            .method
            .parse()
            .map_err(|method| ModelError::UnsupportedMethod {
                pair: pair.clone(),
                method,
            })?;

        let sources = raw
            .sources
            .into_iter()
            .map(|hops| build_chain(&pair, hops))
            .collect::<Result<Vec<_>, _>>()?;

        models.insert(
            pair,
            PriceModel {
                method,
                min_sources: raw.min_sources,
                sources,
            },
        );
    }

    Ok(models)
}

fn parse_pair(text: &str) -> Result<Pair, ModelError> {
    text.parse()
        .map_err(|_| ModelError::InvalidPair(text.to_string()))
}

/// Turn an ordered hop list into a linked reference chain
fn build_chain(context: &Pair, hops: Vec<RawHop>) -> Result<PriceRef, ModelError> {
    let mut refs = Vec::with_capacity(hops.len());
    for hop in hops {
        let pair = match hop.pair {
            Some(text) => parse_pair(&text)?,
            None => context.clone(),
        };
        refs.push(PriceRef {
            origin: Origin::parse(&hop.origin),
            pair,
            next: None,
        });
    }

    let mut iter = refs.into_iter();
    let mut chain = iter
        .next()
        .ok_or_else(|| ModelError::EmptyChain(context.clone()))?;
    let mut current = chain.pair.clone();

    for hop in iter {
        let operator = if hop.pair.base == current.base {
            current = Pair::new(current.quote.clone(), hop.pair.quote.clone());
            Operator::Divide
        } else {
            current = Pair::new(current.base.clone(), hop.pair.quote.clone());
            Operator::Multiply
        };
        chain = chain.then(operator, hop);
    }

    Ok(chain)
}
