//! Static conversion paths
//!
//! Supplies, per target pair, the alternative hop sequences the path
//! orchestrator turns into trade chains.

mod table;

pub use table::PathTable;

use serde::{Deserialize, Serialize};

use crate::price::Pair;

/// Alternative hop sequences for one target pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePaths {
    /// Pair the paths resolve to
    pub target: Pair,
    /// Alternatives, each an ordered list of hops
    pub paths: Vec<Vec<Pair>>,
}

/// Provider of conversion paths
pub trait Pather: Send + Sync {
    /// Every pair paths are configured for
    fn pairs(&self) -> Vec<Pair>;

    /// Paths for `target`, or `None` for an unknown pair
    fn paths(&self, target: &Pair) -> Option<PricePaths>;
}
