//! Synchronous oracle core

use chrono::Duration;
use std::time::Instant;

use crate::aggregator::{Aggregator, MedianAggregator, PathAggregator, ReducerFactory};
use crate::cache::PriceCache;
use crate::config::EngineConfig;
use crate::graph::{PriceModelMap, PriceRef, ResolveError};
use crate::pather::{Pather, PathTable};
use crate::price::{ExchangePair, Pair, PriceAggregate, PricePoint};
use crate::telemetry::{self, CounterMetric};

/// Cache, model graph and optional path orchestrator behind one ingest point
///
/// Not synchronised; wrap it in [`super::OracleService`] to share it.
pub struct Oracle {
    cache: PriceCache,
    models: PriceModelMap,
    paths: Option<PathAggregator<PathTable>>,
}

impl std::fmt::Debug for Oracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Oracle")
            .field("cache", &self.cache)
            .field("models", &self.models)
            .field("paths", &self.paths.is_some())
            .finish()
    }
}

impl Oracle {
    /// Create an oracle over a validated model map
    pub fn new(models: PriceModelMap) -> Self {
        Self {
            cache: PriceCache::new(),
            models,
            paths: None,
        }
    }

    /// Load and validate the documents named by `config`
    pub fn from_config(config: &EngineConfig) -> anyhow::Result<Self> {
        let models = PriceModelMap::load(&config.models)?;
        let mut oracle = Self::new(models).with_window(config.window());

        if let Some(path) = &config.paths {
            let table = PathTable::load(path)?;
            oracle = oracle.with_paths(table, config.window());
        }

        for pair in &config.pairs {
            if oracle.models.get(pair).is_none() {
                anyhow::bail!("Configured pair {} has no price model", pair);
            }
        }

        tracing::info!(
            models = oracle.models.len(),
            paths = oracle.path_pairs().len(),
            "Oracle loaded"
        );
        Ok(oracle)
    }

    /// Pairs to report: the configured ones, or every model
    pub fn report_pairs(&self, configured: &[Pair]) -> Vec<Pair> {
        if configured.is_empty() {
            self.models.pairs()
        } else {
            configured.to_vec()
        }
    }

    /// Resolve graph leaves only from ticks within `window` of the newest
    /// tick of their pair. Call before ingesting.
    pub fn with_window(mut self, window: Duration) -> Self {
        self.cache = PriceCache::with_window(window);
        self
    }

    /// Also run the path orchestrator over `table`, with median reducers of
    /// the given window
    pub fn with_paths(mut self, table: PathTable, window: Duration) -> Self {
        let factory: ReducerFactory = Box::new(move |pair: &Pair| {
            Box::new(MedianAggregator::new(pair.clone(), window))
                as Box<dyn Aggregator<Input = PricePoint>>
        });
        self.paths = Some(PathAggregator::new(table, factory));
        self
    }

    /// Feed one tick to the cache and the path orchestrator
    pub fn ingest(&mut self, point: PricePoint) {
        if !point.is_valid() {
            tracing::debug!(
                exchange = %point.exchange.name,
                pair = %point.pair,
                "Ignoring tick without usable price"
            );
            telemetry::increment(CounterMetric::TicksRejected);
            return;
        }

        self.cache.ingest(&point);
        if let Some(paths) = self.paths.as_mut() {
            paths.ingest(point);
        }
        telemetry::increment(CounterMetric::TicksIngested);
    }

    /// Resolve `pair` through the model graph
    pub fn resolve(&self, pair: &Pair) -> Result<PriceAggregate, ResolveError> {
        let started = Instant::now();
        let result = self.models.resolve_pair(&self.cache, pair);
        telemetry::record_resolve(started.elapsed(), result.as_ref().err().map(|e| e.reason()));

        match &result {
            Ok(agg) => tracing::debug!(pair = %pair, price = %agg.price, "Resolved"),
            Err(e) => tracing::debug!(pair = %pair, reason = %e, "Unresolved"),
        }
        result
    }

    /// Resolve an arbitrary reference chain
    pub fn resolve_ref(&self, price_ref: &PriceRef) -> Option<PriceAggregate> {
        self.models.resolve_ref(&self.cache, price_ref)
    }

    /// Aggregate `pair` through the path table
    ///
    /// `None` when no path table is configured or the pair is not in it.
    pub fn aggregate_paths(&mut self, pair: &Pair) -> Option<PriceAggregate> {
        self.paths.as_mut()?.aggregate(pair)
    }

    /// Leaf exchange markets needed to resolve `pair`
    pub fn sources(&self, pair: &Pair) -> Vec<ExchangePair> {
        self.models.sources(&PriceRef::model(pair.clone()))
    }

    /// Leaf exchange markets needed for every configured model
    pub fn all_sources(&self) -> Vec<ExchangePair> {
        self.models.all_sources()
    }

    /// Pairs the path table is configured for
    pub fn path_pairs(&self) -> Vec<Pair> {
        self.paths
            .as_ref()
            .map(|p| p.pather().pairs())
            .unwrap_or_default()
    }

    pub fn models(&self) -> &PriceModelMap {
        &self.models
    }

    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }
}
