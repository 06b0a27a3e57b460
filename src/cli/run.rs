//! Run command implementation

use clap::Args;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::engine::{Oracle, OracleHandle, OracleService};
use crate::fetch::{Feeder, FetchPool, HttpFetcher, TemplateHandler};
use crate::price::{ExchangePair, Pair};
use crate::telemetry::{self, GaugeMetric};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Run a single refresh round and exit
    #[arg(long)]
    pub once: bool,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let oracle = Oracle::from_config(&config.engine)?;
        let pairs = oracle.report_pairs(&config.engine.pairs);
        let sources = required_sources(&oracle, &pairs);

        for source in &sources {
            if !config.exchanges.iter().any(|e| e.name == source.exchange) {
                tracing::warn!(source = %source, "No exchange endpoint configured");
            }
        }

        let handle = OracleService::spawn(oracle, config.engine.queue_depth);

        let fetcher = Arc::new(HttpFetcher::new(Duration::from_secs(config.fetch.timeout_secs))?);
        let pool = FetchPool::start(fetcher, &config.fetch);
        let feeder = config
            .exchanges
            .iter()
            .fold(Feeder::new(pool, handle.clone()), |feeder, exchange| {
                feeder.with_handler(Arc::new(TemplateHandler::from_config(exchange)))
            });

        tracing::info!(
            pairs = pairs.len(),
            sources = sources.len(),
            interval_secs = config.fetch.interval_secs,
            "Starting oracle loop"
        );

        let mut interval =
            tokio::time::interval(Duration::from_secs(config.fetch.interval_secs.max(1)));

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    feeder.refresh(&sources).await?;
                    report(&handle, &pairs).await?;
                    if self.once {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Leaf markets of the reported pairs, de-duplicated and sorted
fn required_sources(oracle: &Oracle, pairs: &[Pair]) -> Vec<ExchangePair> {
    let mut sources: Vec<ExchangePair> = pairs.iter().flat_map(|p| oracle.sources(p)).collect();
    sources.sort();
    sources.dedup();
    sources
}

async fn report(handle: &OracleHandle, pairs: &[Pair]) -> anyhow::Result<()> {
    let mut resolved = 0;

    for pair in pairs {
        match handle.resolve(pair.clone()).await? {
            Ok(agg) => {
                resolved += 1;
                tracing::info!(
                    pair = %pair,
                    price = %agg.price,
                    sources = agg.leaf_count(),
                    "Price"
                );
            }
            Err(e) => tracing::info!(pair = %pair, reason = %e, "No price"),
        }

        if let Some(agg) = handle.aggregate_paths(pair.clone()).await? {
            tracing::info!(pair = %pair, price = %agg.price, "Path price");
        }
    }

    telemetry::set_gauge(GaugeMetric::ResolvedPairs, resolved as f64);
    Ok(())
}
