//! Worked ETH/USD scenario through both aggregation mechanisms

use chrono::{Duration, Utc};
use price_oracle::engine::Oracle;
use price_oracle::graph::{PriceModelMap, ResolveError};
use price_oracle::pather::PathTable;
use price_oracle::price::{Exchange, Pair, PricePoint};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const MODELS: &str = r#"{
    "ETH/BTC": {"method": "median", "minSources": 2, "sources": [[{"origin": "x"}], [{"origin": "y"}]]},
    "BTC/USD": {"method": "median", "minSources": 2, "sources": [
        [{"origin": "a"}], [{"origin": "b"}], [{"origin": "c"}]
    ]},
    "ETH/USD": {"method": "median", "minSources": 1, "sources": [
        [{"origin": ".", "pair": "ETH/BTC"}, {"origin": ".", "pair": "BTC/USD"}],
        [{"origin": "z", "pair": "ETH/USDT"}, {"origin": "z", "pair": "USDT/USD"}]
    ]}
}"#;

const PATHS: &str = r#"{"ETH/USD": [["ETH/BTC", "BTC/USD"], ["ETH/USDT", "USDT/USD"]]}"#;

fn create_oracle() -> Oracle {
    Oracle::new(PriceModelMap::from_json(MODELS).unwrap())
        .with_window(Duration::seconds(60))
        .with_paths(PathTable::from_json(PATHS).unwrap(), Duration::seconds(60))
}

fn tick(exchange: &str, pair: &str, price: Decimal) -> PricePoint {
    PricePoint::new(Utc::now(), Exchange::new(exchange), pair.parse().unwrap(), price)
}

fn ingest_scenario(oracle: &mut Oracle) {
    for point in [
        tick("x", "ETH/BTC", dec!(2)),
        tick("y", "ETH/BTC", dec!(4)),
        tick("a", "BTC/USD", dec!(3)),
        tick("b", "BTC/USD", dec!(10)),
        tick("c", "BTC/USD", dec!(20)),
        tick("z", "ETH/USDT", dec!(3)),
        tick("z", "USDT/USD", dec!(3)),
    ] {
        oracle.ingest(point);
    }
}

#[test]
fn test_scenario_through_model_graph() {
    let mut oracle = create_oracle();
    ingest_scenario(&mut oracle);

    assert_eq!(oracle.resolve(&Pair::new("ETH", "BTC")).unwrap().price, dec!(3));
    assert_eq!(oracle.resolve(&Pair::new("BTC", "USD")).unwrap().price, dec!(10));

    let eth = oracle.resolve(&Pair::new("ETH", "USD")).unwrap();
    assert_eq!(eth.price, dec!(19));
    assert_eq!(eth.pair, Pair::new("ETH", "USD"));
    assert_eq!(eth.children.len(), 2);
    assert_eq!(eth.leaf_count(), 7);
}

#[test]
fn test_scenario_through_path_table() {
    let mut oracle = create_oracle();
    ingest_scenario(&mut oracle);

    let eth = oracle.aggregate_paths(&Pair::new("ETH", "USD")).unwrap();
    assert_eq!(eth.price, dec!(19));

    let mut prices: Vec<Decimal> = eth.children.iter().map(|c| c.price).collect();
    prices.sort();
    assert_eq!(prices, vec![dec!(9), dec!(30)]);
}

#[test]
fn test_quorum_degrades_gracefully() {
    let mut oracle = create_oracle();
    oracle.ingest(tick("z", "ETH/USDT", dec!(3)));
    oracle.ingest(tick("z", "USDT/USD", dec!(3)));

    // ETH/BTC and BTC/USD lack quorum; the USDT route alone satisfies ETH/USD
    assert!(matches!(
        oracle.resolve(&Pair::new("BTC", "USD")),
        Err(ResolveError::InsufficientSources { .. })
    ));
    assert_eq!(oracle.resolve(&Pair::new("ETH", "USD")).unwrap().price, dec!(9));
}

#[test]
fn test_known_pair_without_data_vs_unknown_pair() {
    let mut oracle = create_oracle();

    let empty = oracle.aggregate_paths(&Pair::new("ETH", "USD")).unwrap();
    assert_eq!(empty.price, Decimal::ZERO);
    assert!(empty.children.is_empty());

    assert!(oracle.aggregate_paths(&Pair::new("SOL", "USD")).is_none());
    assert!(matches!(
        oracle.resolve(&Pair::new("SOL", "USD")),
        Err(ResolveError::NotFound(_))
    ));
}

#[test]
fn test_stale_ticks_leave_window() {
    let mut oracle = create_oracle();
    let now = Utc::now();
    let old = now - Duration::seconds(120);

    oracle.ingest(PricePoint::new(old, Exchange::new("z"), Pair::new("ETH", "USDT"), dec!(5)));
    oracle.ingest(PricePoint::new(now, Exchange::new("w"), Pair::new("ETH", "USDT"), dec!(3)));
    oracle.ingest(tick("z", "USDT/USD", dec!(3)));

    // The path reducer for ETH/USDT only sees the fresh tick
    let eth = oracle.aggregate_paths(&Pair::new("ETH", "USD")).unwrap();
    assert_eq!(eth.price, dec!(9));

    // The graph reads z:ETH/USDT, which is now outside the window
    assert!(matches!(
        oracle.resolve(&Pair::new("ETH", "USD")),
        Err(ResolveError::InsufficientSources { resolved: 0, .. })
    ));
}

#[test]
fn test_sources_of_scenario() {
    let oracle = create_oracle();
    let sources: Vec<String> = oracle
        .sources(&Pair::new("ETH", "USD"))
        .iter()
        .map(|s| s.to_string())
        .collect();

    assert_eq!(
        sources,
        vec![
            "a:BTC/USD",
            "b:BTC/USD",
            "c:BTC/USD",
            "x:ETH/BTC",
            "y:ETH/BTC",
            "z:ETH/USDT",
            "z:USDT/USD",
        ]
    );
}
