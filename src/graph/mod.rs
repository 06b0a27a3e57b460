//! Price model graph
//!
//! Declarative per-pair models: each pair is the median of alternative
//! source chains, where a chain reads exchange ticks directly or recurses
//! into other pairs' models. The graph is validated once when loaded and is
//! immutable afterwards.

mod document;
mod resolver;
mod types;
mod validate;

pub use resolver::Resolver;
pub use types::{
    Link, Method, ModelError, Operator, Origin, PriceModel, PriceRef, ResolveError, MODEL_ORIGIN,
};

use anyhow::Context;
use std::collections::BTreeMap;
use std::path::Path;

use crate::cache::CacheGetter;
use crate::price::{ExchangePair, Pair, PriceAggregate};

/// Validated pair -> model map
#[derive(Debug, Clone, Default)]
pub struct PriceModelMap {
    models: BTreeMap<Pair, PriceModel>,
}

impl PriceModelMap {
    /// Build a map, rejecting invalid or cyclic configurations
    pub fn new(models: BTreeMap<Pair, PriceModel>) -> Result<Self, ModelError> {
        validate::validate(&models)?;
        Ok(Self { models })
    }

    /// Parse and validate a JSON model document
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let raw: document::RawDocument =
            serde_json::from_str(json).context("Invalid price model document")?;
        let models = document::convert(raw)?;
        Ok(Self::new(models)?)
    }

    /// Load a JSON model document from disk
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read price models {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("In {}", path.display()))
    }

    /// Model of `pair`
    pub fn get(&self, pair: &Pair) -> Option<&PriceModel> {
        self.models.get(pair)
    }

    /// Every configured pair, in order
    pub fn pairs(&self) -> Vec<Pair> {
        self.models.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Resolve `pair` against `cache`
    pub fn resolve_pair<C: CacheGetter + ?Sized>(
        &self,
        cache: &C,
        pair: &Pair,
    ) -> Result<PriceAggregate, ResolveError> {
        Resolver::new(self, cache).resolve_pair(pair)
    }

    /// Resolve a reference chain; `None` when it cannot be priced
    pub fn resolve_ref<C: CacheGetter + ?Sized>(
        &self,
        cache: &C,
        price_ref: &PriceRef,
    ) -> Option<PriceAggregate> {
        Resolver::new(self, cache).resolve_ref(price_ref).ok()
    }

    /// Leaf exchange markets needed for `root`, de-duplicated and sorted
    pub fn sources(&self, root: &PriceRef) -> Vec<ExchangePair> {
        resolver::collect_sources(self, root)
    }

    /// Leaf exchange markets needed for every configured pair
    pub fn all_sources(&self) -> Vec<ExchangePair> {
        let mut all: Vec<ExchangePair> = self
            .models
            .keys()
            .flat_map(|pair| self.sources(&PriceRef::model(pair.clone())))
            .collect();
        all.sort();
        all.dedup();
        all
    }
}
