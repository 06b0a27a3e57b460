//! Oracle engine
//!
//! [`Oracle`] ties the cache, the model graph and the path orchestrator
//! together; [`OracleService`] serialises access to it through one task.

mod oracle;
mod service;

pub use oracle::Oracle;
pub use service::{OracleHandle, OracleService};

use thiserror::Error;

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// The oracle task is no longer running
    #[error("Oracle task stopped")]
    Stopped,
}
