//! Validate command implementation

use clap::Args;

use crate::config::Config;
use crate::engine::Oracle;

#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let oracle = Oracle::from_config(&config.engine)?;

        println!("Configuration OK");
        println!("  Models: {}", oracle.models().len());
        println!("  Paths: {}", oracle.path_pairs().len());
        println!("  Leaf sources: {}", oracle.all_sources().len());
        println!("  Exchanges: {}", config.exchanges.len());
        Ok(())
    }
}
