//! Oracle task shared by concurrent producers

use async_trait::async_trait;
use chrono::Utc;
use price_oracle::engine::{EngineError, Oracle, OracleService};
use price_oracle::fetch::{
    ExchangeHandler, Feeder, FetchError, FetchPool, Fetcher, RetryPolicy, TemplateHandler,
};
use price_oracle::graph::{PriceModelMap, ResolveError};
use price_oracle::price::{Exchange, Pair, PricePoint};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

const MODELS: &str = r#"{
    "BTC/USD": {"method": "median", "minSources": 3, "sources": [
        [{"origin": "a"}], [{"origin": "b"}], [{"origin": "c"}], [{"origin": "d"}]
    ]}
}"#;

/// Answers 503 once per URL, then the canned body
struct FlakyExchange {
    bodies: HashMap<String, String>,
    seen: std::sync::Mutex<HashMap<String, u32>>,
    calls: AtomicU32,
}

#[async_trait]
impl Fetcher for FlakyExchange {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let first = {
            let mut seen = self.seen.lock().unwrap();
            let count = seen.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count == 1
        };
        if first {
            return Err(FetchError::Status(503));
        }
        self.bodies.get(url).cloned().ok_or(FetchError::Status(404))
    }
}

fn create_policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 2,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(2),
    }
}

#[tokio::test]
async fn test_many_producers_one_writer() {
    let handle = OracleService::spawn(Oracle::new(PriceModelMap::from_json(MODELS).unwrap()), 4);
    let pair = Pair::new("BTC", "USD");
    let start = Utc::now();

    let mut tasks = vec![];
    for (exchange, base) in [("a", 100), ("b", 200), ("c", 300), ("d", 400)] {
        let handle = handle.clone();
        let pair = pair.clone();
        tasks.push(tokio::spawn(async move {
            // Each producer sends ascending prices; only the newest survives
            for step in 0..50 {
                let point = PricePoint::new(
                    start + chrono::Duration::milliseconds(step),
                    Exchange::new(exchange),
                    pair.clone(),
                    Decimal::from(base + step),
                );
                handle.ingest(point).await?;
            }
            Ok::<_, EngineError>(())
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let result = handle.resolve(pair).await.unwrap().unwrap();
    assert_eq!(result.price, dec!(299));
    assert_eq!(result.children.len(), 4);
}

#[tokio::test]
async fn test_insufficient_then_sufficient() {
    let handle = OracleService::spawn(Oracle::new(PriceModelMap::from_json(MODELS).unwrap()), 16);
    let pair = Pair::new("BTC", "USD");

    for exchange in ["a", "b"] {
        handle
            .ingest(PricePoint::new(Utc::now(), Exchange::new(exchange), pair.clone(), dec!(10)))
            .await
            .unwrap();
    }
    assert!(matches!(
        handle.resolve(pair.clone()).await.unwrap(),
        Err(ResolveError::InsufficientSources { resolved: 2, required: 3, .. })
    ));

    handle
        .ingest(PricePoint::new(Utc::now(), Exchange::new("c"), pair.clone(), dec!(13)))
        .await
        .unwrap();
    assert_eq!(handle.resolve(pair).await.unwrap().unwrap().price, dec!(10));
}

#[tokio::test]
async fn test_feeder_retries_into_oracle() {
    let handle = OracleService::spawn(Oracle::new(PriceModelMap::from_json(MODELS).unwrap()), 16);

    let mut bodies = HashMap::new();
    for (exchange, price) in [("a", "100"), ("b", "101"), ("c", "102"), ("d", "103")] {
        bodies.insert(
            format!("http://{exchange}/BTC/USD"),
            format!(r#"{{"price": "{price}"}}"#),
        );
    }
    let fetcher = Arc::new(FlakyExchange {
        bodies,
        seen: std::sync::Mutex::new(HashMap::new()),
        calls: AtomicU32::new(0),
    });

    let pool = FetchPool::with_policy(fetcher.clone(), 2, 4, create_policy());
    let mut feeder = Feeder::new(pool, handle.clone());
    for exchange in ["a", "b", "c", "d"] {
        let handler: Arc<dyn ExchangeHandler> = Arc::new(TemplateHandler::new(
            Exchange::new(exchange),
            format!("http://{exchange}/{{base}}/{{quote}}"),
        ));
        feeder = feeder.with_handler(handler);
    }

    let sources = handle.sources(None).await.unwrap();
    assert_eq!(feeder.refresh(&sources).await.unwrap(), 4);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 8);

    let result = handle.resolve(Pair::new("BTC", "USD")).await.unwrap().unwrap();
    assert_eq!(result.price, dec!(101));
}
