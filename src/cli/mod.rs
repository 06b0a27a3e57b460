//! CLI interface for price-oracle
//!
//! Provides subcommands for:
//! - `validate`: Load and check the model documents
//! - `sources`: List the exchange markets a pair depends on
//! - `replay`: Resolve pairs from recorded ticks
//! - `run`: Poll exchanges and resolve periodically

mod replay;
mod run;
mod sources;
mod validate;

pub use replay::ReplayArgs;
pub use run::RunArgs;
pub use sources::SourcesArgs;
pub use validate::ValidateArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "price-oracle")]
#[command(about = "Aggregates exchange ticks into reference prices")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load and validate price models and path table
    Validate(ValidateArgs),
    /// Print the leaf exchange markets of a pair
    Sources(SourcesArgs),
    /// Resolve pairs from a JSON-lines tick file
    Replay(ReplayArgs),
    /// Poll exchanges and resolve pairs periodically
    Run(RunArgs),
}
