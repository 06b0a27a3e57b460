//! Recursive evaluation of price references
//!
//! A resolver lives for one top-level call. Within that call each model pair
//! is resolved at most once; nothing is kept between calls.

use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};

use super::types::{Link, Operator, Origin, PriceRef, ResolveError};
use super::PriceModelMap;
use crate::aggregator::median;
use crate::cache::CacheGetter;
use crate::price::{ExchangePair, Pair, PriceAggregate, DIVIDE, MEDIAN, MULTIPLY};

/// Evaluator of references against a model map and a cache
pub struct Resolver<'a, C: CacheGetter + ?Sized> {
    models: &'a PriceModelMap,
    cache: &'a C,
    resolved: HashMap<Pair, Result<PriceAggregate, ResolveError>>,
}

impl<'a, C: CacheGetter + ?Sized> Resolver<'a, C> {
    pub fn new(models: &'a PriceModelMap, cache: &'a C) -> Self {
        Self {
            models,
            cache,
            resolved: HashMap::new(),
        }
    }

    /// Resolve a reference and everything chained to it
    pub fn resolve_ref(&mut self, price_ref: &PriceRef) -> Result<PriceAggregate, ResolveError> {
        let head = self.resolve_hop(price_ref)?;
        self.fold(head, price_ref.next.as_deref())
    }

    /// Resolve a pair through its price model
    pub fn resolve_pair(&mut self, pair: &Pair) -> Result<PriceAggregate, ResolveError> {
        if let Some(result) = self.resolved.get(pair) {
            return result.clone();
        }

        let result = self.evaluate_model(pair);
        self.resolved.insert(pair.clone(), result.clone());
        result
    }

    fn evaluate_model(&mut self, pair: &Pair) -> Result<PriceAggregate, ResolveError> {
        let models = self.models;
        let model = models
            .get(pair)
            .ok_or_else(|| ResolveError::NotFound(pair.clone()))?;

        let mut resolved = Vec::with_capacity(model.sources.len());
        for chain in &model.sources {
            match self.resolve_ref(chain) {
                Ok(result) if result.is_valid() => resolved.push(result),
                Ok(_) => tracing::debug!(pair = %pair, "Source chain resolved to zero"),
                Err(e) => tracing::debug!(pair = %pair, reason = %e, "Source chain unresolved"),
            }
        }

        if resolved.len() < model.min_sources {
            return Err(ResolveError::InsufficientSources {
                pair: pair.clone(),
                resolved: resolved.len(),
                required: model.min_sources,
            });
        }

        let prices: Vec<Decimal> = resolved.iter().map(|r| r.price).collect();
        Ok(PriceAggregate::node(
            pair.clone(),
            median(&prices),
            MEDIAN,
            resolved,
        ))
    }

    /// Resolve a single hop, ignoring what is chained after it
    fn resolve_hop(&mut self, price_ref: &PriceRef) -> Result<PriceAggregate, ResolveError> {
        match &price_ref.origin {
            Origin::Exchange(exchange) => {
                let result = self.cache.get(exchange, &price_ref.pair).ok_or_else(|| {
                    ResolveError::MissingTick {
                        exchange: exchange.clone(),
                        pair: price_ref.pair.clone(),
                    }
                })?;
                if !result.is_valid() {
                    return Err(ResolveError::ZeroPrice(price_ref.pair.clone()));
                }
                Ok(result)
            }
            Origin::Model => self.resolve_pair(&price_ref.pair),
        }
    }

    fn fold(
        &mut self,
        left: PriceAggregate,
        link: Option<&Link>,
    ) -> Result<PriceAggregate, ResolveError> {
        let link = match link {
            Some(link) if link.operator != Operator::Noop => link,
            _ => return Ok(left),
        };

        let right = self.resolve_hop(&link.target)?;
        let combined = combine(left, link.operator, right)?;
        self.fold(combined, link.target.next.as_deref())
    }
}

/// Combine two resolved values
///
/// Multiply gives `(left.base, right.quote)` priced `left * right`; divide
/// gives `(left.quote, right.quote)` priced `right / left`.
fn combine(
    left: PriceAggregate,
    operator: Operator,
    right: PriceAggregate,
) -> Result<PriceAggregate, ResolveError> {
    let (pair, price, model) = match operator {
        Operator::Noop => return Ok(left),
        Operator::Multiply => (
            Pair::new(left.pair.base.clone(), right.pair.quote.clone()),
            left.price.checked_mul(right.price),
            MULTIPLY,
        ),
        Operator::Divide => (
            Pair::new(left.pair.quote.clone(), right.pair.quote.clone()),
            right.price.checked_div(left.price),
            DIVIDE,
        ),
    };

    match price {
        Some(price) if !price.is_zero() => {
            Ok(PriceAggregate::node(pair, price, model, vec![left, right]))
        }
        _ => Err(ResolveError::ZeroPrice(pair)),
    }
}

/// Every exchange market needed to evaluate `root`, without reading ticks
pub(crate) fn collect_sources(models: &PriceModelMap, root: &PriceRef) -> Vec<ExchangePair> {
    let mut sources = BTreeSet::new();
    let mut visited = BTreeSet::new();
    walk(models, root, &mut sources, &mut visited);
    sources.into_iter().collect()
}

fn walk<'a>(
    models: &'a PriceModelMap,
    chain: &'a PriceRef,
    sources: &mut BTreeSet<ExchangePair>,
    visited: &mut BTreeSet<&'a Pair>,
) {
    for (_, hop) in chain.hops() {
        match &hop.origin {
            Origin::Exchange(exchange) => {
                sources.insert(ExchangePair::new(exchange.clone(), hop.pair.clone()));
            }
            Origin::Model => {
                if !visited.insert(&hop.pair) {
                    continue;
                }
                if let Some(model) = models.get(&hop.pair) {
                    for source in &model.sources {
                        walk(models, source, sources, visited);
                    }
                }
            }
        }
    }
}
