//! Exchange polling
//!
//! A bounded pool of workers performs HTTP requests with retry and backoff;
//! [`Feeder`] turns configured exchange endpoints into ticks and hands them
//! to the oracle task.

mod feeder;
mod http;
mod pool;
mod types;

pub use feeder::{ExchangeHandler, Feeder, TemplateHandler};
pub use http::HttpFetcher;
pub use pool::FetchPool;
pub use types::{FetchError, RetryPolicy};

use async_trait::async_trait;

/// Source of raw response bodies
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` and return the body
    async fn get(&self, url: &str) -> Result<String, FetchError>;
}
