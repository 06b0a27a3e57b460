//! Sources command implementation

use clap::Args;

use crate::config::Config;
use crate::engine::Oracle;
use crate::price::Pair;

#[derive(Args, Debug)]
pub struct SourcesArgs {
    /// Pair to inspect, as BASE/QUOTE
    pub pair: Pair,
}

impl SourcesArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let oracle = Oracle::from_config(&config.engine)?;
        if oracle.models().get(&self.pair).is_none() {
            anyhow::bail!("No price model for {}", self.pair);
        }

        for source in oracle.sources(&self.pair) {
            println!("{}", source);
        }
        Ok(())
    }
}
