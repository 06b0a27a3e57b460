//! Replay command implementation

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::engine::Oracle;
use crate::price::{Pair, PriceAggregate, PricePoint};

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// JSON-lines file of ticks, oldest first
    #[arg(long)]
    pub ticks: PathBuf,

    /// Pairs to resolve; defaults to the configured pairs
    pub pairs: Vec<Pair>,
}

/// One line of replay output
#[derive(Debug, Serialize)]
struct ReplayResult {
    pair: Pair,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved: Option<PriceAggregate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    paths: Option<PriceAggregate>,
}

impl ReplayArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let mut oracle = Oracle::from_config(&config.engine)?;

        let ticks = read_ticks(&self.ticks)?;
        let count = ticks.len();
        for tick in ticks {
            oracle.ingest(tick);
        }
        tracing::info!(ticks = count, cached = oracle.cache().len(), "Replayed ticks");

        let configured = if self.pairs.is_empty() {
            &config.engine.pairs
        } else {
            &self.pairs
        };

        for pair in oracle.report_pairs(configured) {
            let result = replay_pair(&mut oracle, pair);
            println!("{}", serde_json::to_string(&result)?);
        }
        Ok(())
    }
}

fn replay_pair(oracle: &mut Oracle, pair: Pair) -> ReplayResult {
    let (resolved, error) = match oracle.resolve(&pair) {
        Ok(agg) => (Some(agg), None),
        Err(e) => (None, Some(e.to_string())),
    };
    let paths = oracle.aggregate_paths(&pair);

    ReplayResult {
        pair,
        resolved,
        error,
        paths,
    }
}

/// Parse a JSON-lines tick file, skipping blank lines
pub(crate) fn read_ticks(path: &Path) -> anyhow::Result<Vec<PricePoint>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open ticks {}", path.display()))?;

    let mut ticks = Vec::new();
    for (index, line) in std::io::BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let tick: PricePoint = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid tick", path.display(), index + 1))?;
        ticks.push(tick);
    }
    Ok(ticks)
}
