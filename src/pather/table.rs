//! Path table loaded from configuration

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;

use super::{Pather, PricePaths};
use crate::graph::ModelError;
use crate::price::Pair;

/// Path table keyed by the canonical `"BASE/QUOTE"` text
///
/// Document form:
/// `{"ETH/USD": [["ETH/BTC", "BTC/USD"], ["ETH/USDT", "USDT/USD"]]}`
#[derive(Debug, Clone, Default)]
pub struct PathTable {
    paths: BTreeMap<String, PricePaths>,
}

impl PathTable {
    /// Build a table, checking that every alternative chains into its target
    pub fn new(entries: Vec<PricePaths>) -> Result<Self, ModelError> {
        let mut paths = BTreeMap::new();
        for entry in entries {
            for hops in &entry.paths {
                check_hops(&entry.target, hops)?;
            }
            paths.insert(entry.target.to_string(), entry);
        }
        Ok(Self { paths })
    }

    /// Parse and validate a JSON path document
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let document: BTreeMap<String, Vec<Vec<Pair>>> =
            serde_json::from_str(json).context("Invalid path document")?;

        let mut entries = Vec::with_capacity(document.len());
        for (key, paths) in document {
            let target: Pair = key
                .parse()
                .map_err(|_| ModelError::InvalidPair(key.clone()))?;
            entries.push(PricePaths { target, paths });
        }
        Ok(Self::new(entries)?)
    }

    /// Load a JSON path document from disk
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read path table {}", path.display()))?;
        Self::from_json(&content)
    }

    /// Number of configured target pairs
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether no pair is configured
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Pather for PathTable {
    fn pairs(&self) -> Vec<Pair> {
        self.paths.values().map(|p| p.target.clone()).collect()
    }

    fn paths(&self, target: &Pair) -> Option<PricePaths> {
        self.paths.get(&target.to_string()).cloned()
    }
}

/// Walk the hops with the trade rule and check they end at `target`
fn check_hops(target: &Pair, hops: &[Pair]) -> Result<(), ModelError> {
    let mut iter = hops.iter();
    let mut current = iter
        .next()
        .cloned()
        .ok_or_else(|| ModelError::EmptyChain(target.clone()))?;

    for hop in iter {
        current = if hop.base == current.base {
            Pair::new(current.quote.clone(), hop.quote.clone())
        } else if hop.base == current.quote {
            Pair::new(current.base.clone(), hop.quote.clone())
        } else {
            return Err(ModelError::DisconnectedHop {
                target: target.clone(),
                from: current,
                hop: hop.clone(),
            });
        };
    }

    if current != *target {
        return Err(ModelError::ChainMismatch {
            target: target.clone(),
            produced: current,
        });
    }
    Ok(())
}
