//! Tick polling from exchange endpoints

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use super::{FetchError, FetchPool};
use crate::config::ExchangeConfig;
use crate::engine::OracleHandle;
use crate::price::{Exchange, ExchangePair, Pair, PricePoint};
use crate::telemetry::{self, CounterMetric};

/// Knows where one exchange publishes ticks and how to read them
pub trait ExchangeHandler: Send + Sync {
    /// Exchange this handler serves
    fn exchange(&self) -> &Exchange;

    /// Endpoint for `pair`
    fn url(&self, pair: &Pair) -> String;

    /// Turn a response body into a tick for `pair`
    fn parse(&self, pair: &Pair, body: &str) -> Result<PricePoint, FetchError>;
}

/// Ticker body understood by [`TemplateHandler`]
#[derive(Debug, Deserialize)]
struct TickerBody {
    #[serde(default)]
    ask: Decimal,
    #[serde(default)]
    bid: Decimal,
    #[serde(default)]
    price: Decimal,
    #[serde(default)]
    volume: Decimal,
    timestamp: Option<DateTime<Utc>>,
}

/// Handler for endpoints returning a flat JSON ticker
///
/// The URL template may contain `{base}` and `{quote}`. The body must be an
/// object with any of `ask`, `bid`, `price`, `volume` and an optional RFC 3339
/// `timestamp`; a missing timestamp means "now".
pub struct TemplateHandler {
    exchange: Exchange,
    url_template: String,
}

impl TemplateHandler {
    pub fn new(exchange: Exchange, url_template: impl Into<String>) -> Self {
        Self {
            exchange,
            url_template: url_template.into(),
        }
    }

    pub fn from_config(config: &ExchangeConfig) -> Self {
        let exchange = Exchange {
            name: config.name.clone(),
            config: config.options.clone(),
        };
        Self::new(exchange, config.url_template.clone())
    }
}

impl ExchangeHandler for TemplateHandler {
    fn exchange(&self) -> &Exchange {
        &self.exchange
    }

    fn url(&self, pair: &Pair) -> String {
        self.url_template
            .replace("{base}", &pair.base)
            .replace("{quote}", &pair.quote)
    }

    fn parse(&self, pair: &Pair, body: &str) -> Result<PricePoint, FetchError> {
        let ticker: TickerBody =
            serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;

        Ok(PricePoint {
            timestamp: ticker.timestamp.unwrap_or_else(Utc::now),
            exchange: self.exchange.clone(),
            pair: pair.clone(),
            ask: ticker.ask,
            bid: ticker.bid,
            price: ticker.price,
            volume: ticker.volume,
        })
    }
}

/// Polls leaf markets through a [`FetchPool`] and feeds the oracle
pub struct Feeder {
    pool: FetchPool,
    handlers: HashMap<String, Arc<dyn ExchangeHandler>>,
    oracle: OracleHandle,
}

impl Feeder {
    pub fn new(pool: FetchPool, oracle: OracleHandle) -> Self {
        Self {
            pool,
            handlers: HashMap::new(),
            oracle,
        }
    }

    /// Register a handler, replacing any other for the same exchange
    pub fn with_handler(mut self, handler: Arc<dyn ExchangeHandler>) -> Self {
        self.handlers
            .insert(handler.exchange().name.clone(), handler);
        self
    }

    /// Fetch every source concurrently and ingest what parses
    ///
    /// Returns the number of ticks handed to the oracle. Failures are logged
    /// and counted; they never abort the round.
    pub async fn refresh(&self, sources: &[ExchangePair]) -> anyhow::Result<usize> {
        telemetry::set_gauge(telemetry::GaugeMetric::PolledSources, sources.len() as f64);

        let results = join_all(sources.iter().map(|source| self.fetch_one(source))).await;

        let mut ingested = 0;
        for (source, result) in sources.iter().zip(results) {
            match result {
                Ok(point) => {
                    self.oracle.ingest(point).await?;
                    ingested += 1;
                }
                Err(e) => {
                    tracing::warn!(source = %source, error = %e, "Source refresh failed");
                    telemetry::increment(CounterMetric::FetchFailures);
                }
            }
        }

        tracing::debug!(sources = sources.len(), ingested, "Refresh round complete");
        Ok(ingested)
    }

    async fn fetch_one(&self, source: &ExchangePair) -> Result<PricePoint, FetchError> {
        let handler = self
            .handlers
            .get(&source.exchange)
            .ok_or_else(|| FetchError::UnknownExchange(source.exchange.clone()))?;

        let body = self.pool.fetch(handler.url(&source.pair)).await?;
        handler.parse(&source.pair, &body)
    }
}
