//! Fetch layer types

use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::config::FetchConfig;

/// Fetch errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection, timeout or body read failure
    #[error("Transport error: {0}")]
    Transport(String),
    /// Non-success HTTP status
    #[error("HTTP status {0}")]
    Status(u16),
    /// Retryable failure that persisted
    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
    /// Body could not be turned into a tick
    #[error("Parse error: {0}")]
    Parse(String),
    /// No handler configured for the exchange
    #[error("Unknown exchange {0}")]
    UnknownExchange(String),
    /// Pool workers are gone
    #[error("Fetch pool closed")]
    PoolClosed,
}

impl FetchError {
    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport(_) => true,
            FetchError::Status(status) => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }
}

/// One queued request
pub(crate) struct FetchJob {
    pub id: Uuid,
    pub url: String,
    pub reply: oneshot::Sender<Result<String, FetchError>>,
}

/// Retry schedule of a worker
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound of any delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Randomised delay before retry number `attempt` (1-based)
    ///
    /// Doubles per attempt up to `max_delay`, then scales by a random factor
    /// in [0.5, 1.0].
    pub fn delay(&self, attempt: u32) -> Duration {
        use rand::Rng;

        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        let base = self.initial_delay.saturating_mul(factor).min(self.max_delay);
        let jitter: f64 = rand::thread_rng().gen_range(0.5..=1.0);
        base.mul_f64(jitter)
    }
}

impl From<&FetchConfig> for RetryPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.initial_backoff_ms),
            max_delay: Duration::from_millis(config.max_backoff_ms),
        }
    }
}
