//! Configuration and document loading

use price_oracle::config::Config;
use price_oracle::engine::Oracle;
use price_oracle::price::{Pair, PricePoint};
use rust_decimal_macros::dec;
use std::path::{Path, PathBuf};

fn demos() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos")
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_demo_config_loads() {
    let config = Config::load(demos().join("config.toml")).unwrap();
    assert_eq!(config.exchanges.len(), 4);
    assert_eq!(config.engine.pairs.len(), 3);

    let oracle = Oracle::from_config(&config.engine).unwrap();
    assert_eq!(oracle.models().len(), 4);
    assert_eq!(oracle.path_pairs().len(), 2);

    // Every leaf source has a configured endpoint
    for source in oracle.all_sources() {
        assert!(
            config.exchanges.iter().any(|e| e.name == source.exchange),
            "no endpoint for {}",
            source
        );
    }
}

#[test]
fn test_demo_ticks_replay() {
    let config = Config::load(demos().join("config.toml")).unwrap();
    let mut oracle = Oracle::from_config(&config.engine).unwrap();

    let ticks = std::fs::read_to_string(demos().join("ticks.jsonl")).unwrap();
    for line in ticks.lines().filter(|l| !l.trim().is_empty()) {
        let tick: PricePoint = serde_json::from_str(line).unwrap();
        oracle.ingest(tick);
    }

    let btc = Pair::new("BTC", "USD");
    assert_eq!(oracle.resolve(&btc).unwrap().price, dec!(60010));
    assert_eq!(oracle.aggregate_paths(&btc).unwrap().price, dec!(60020));

    let eth = oracle.resolve(&Pair::new("ETH", "USD")).unwrap();
    assert_eq!(eth.price, dec!(3001.2));
    assert_eq!(eth.children.len(), 4);

    let eur = oracle.resolve(&Pair::new("USD", "EUR")).unwrap();
    assert_eq!(eur.pair, Pair::new("USD", "EUR"));
    assert!(eur.price > dec!(0.9) && eur.price < dec!(0.95));
}

#[test]
fn test_cyclic_models_refuse_startup() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "models.json",
        r#"{
            "A/B": {"method": "median", "sources": [[{"origin": ".", "pair": "A/C"}, {"origin": "x", "pair": "C/B"}]]},
            "A/C": {"method": "median", "sources": [[{"origin": ".", "pair": "A/B"}, {"origin": "x", "pair": "B/C"}]]}
        }"#,
    );
    let config_path = write(dir.path(), "oracle.toml", "[engine]\nmodels = \"models.json\"\n");

    let config = Config::load(&config_path).unwrap();
    let err = Oracle::from_config(&config.engine).unwrap_err();
    assert!(format!("{:#}", err).contains("Cyclic"));
}

#[test]
fn test_unmodelled_configured_pair_refused() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "models.json",
        r#"{"A/B": {"method": "median", "sources": [[{"origin": "x"}]]}}"#,
    );
    let config_path = write(
        dir.path(),
        "oracle.toml",
        "[engine]\nmodels = \"models.json\"\npairs = [\"C/D\"]\n",
    );

    let config = Config::load(&config_path).unwrap();
    assert!(Oracle::from_config(&config.engine).is_err());
}

#[test]
fn test_invalid_path_table_refused() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "models.json",
        r#"{"A/B": {"method": "median", "sources": [[{"origin": "x"}]]}}"#,
    );
    write(dir.path(), "paths.json", r#"{"A/B": [["A/C", "D/B"]]}"#);
    let config_path = write(
        dir.path(),
        "oracle.toml",
        "[engine]\nmodels = \"models.json\"\npaths = \"paths.json\"\n",
    );

    let config = Config::load(&config_path).unwrap();
    assert!(Oracle::from_config(&config.engine).is_err());
}

#[test]
fn test_missing_models_file() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write(dir.path(), "oracle.toml", "[engine]\nmodels = \"absent.json\"\n");

    let config = Config::load(&config_path).unwrap();
    let err = Oracle::from_config(&config.engine).unwrap_err();
    assert!(err.to_string().contains("Failed to read price models"));
}
