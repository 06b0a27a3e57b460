//! Bounded worker pool with retry

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use uuid::Uuid;

use super::types::FetchJob;
use super::{FetchError, Fetcher, RetryPolicy};
use crate::config::FetchConfig;
use crate::telemetry::{self, CounterMetric};

/// Fixed set of fetch workers behind a bounded queue
///
/// Submitting waits while the queue is full. Each job gets its own reply
/// channel, so callers may await results in any order.
#[derive(Clone)]
pub struct FetchPool {
    tx: mpsc::Sender<FetchJob>,
}

impl FetchPool {
    /// Spawn the workers described by `config`
    pub fn start(fetcher: Arc<dyn Fetcher>, config: &FetchConfig) -> Self {
        Self::with_policy(
            fetcher,
            config.workers,
            config.queue_depth,
            RetryPolicy::from(config),
        )
    }

    /// Spawn `workers` workers sharing one queue of `queue_depth` jobs
    pub fn with_policy(
        fetcher: Arc<dyn Fetcher>,
        workers: usize,
        queue_depth: usize,
        policy: RetryPolicy,
    ) -> Self {
        let (tx, rx) = mpsc::channel(queue_depth.max(1));
        let rx = Arc::new(Mutex::new(rx));

        for worker in 0..workers.max(1) {
            tokio::spawn(run_worker(worker, fetcher.clone(), rx.clone(), policy));
        }

        Self { tx }
    }

    /// Queue a GET of `url` and wait for its outcome
    pub async fn fetch(&self, url: impl Into<String>) -> Result<String, FetchError> {
        let (reply, result) = oneshot::channel();
        let job = FetchJob {
            id: Uuid::new_v4(),
            url: url.into(),
            reply,
        };

        self.tx.send(job).await.map_err(|_| FetchError::PoolClosed)?;
        result.await.map_err(|_| FetchError::PoolClosed)?
    }
}

async fn run_worker(
    worker: usize,
    fetcher: Arc<dyn Fetcher>,
    rx: Arc<Mutex<mpsc::Receiver<FetchJob>>>,
    policy: RetryPolicy,
) {
    loop {
        let job = {
            let mut rx = rx.lock().await;
            rx.recv().await
        };
        let Some(job) = job else {
            break;
        };

        tracing::trace!(worker, job = %job.id, url = %job.url, "Fetching");
        let result = fetch_with_retry(fetcher.as_ref(), &job.url, &policy).await;
        if let Err(e) = &result {
            tracing::warn!(worker, job = %job.id, url = %job.url, error = %e, "Fetch failed");
        }
        let _ = job.reply.send(result);
    }

    tracing::debug!(worker, "Fetch worker stopped");
}

/// Run one request, retrying transient failures per `policy`
pub(crate) async fn fetch_with_retry(
    fetcher: &dyn Fetcher,
    url: &str,
    policy: &RetryPolicy,
) -> Result<String, FetchError> {
    let mut attempt = 0u32;

    loop {
        match fetcher.get(url).await {
            Ok(body) => return Ok(body),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) if attempt >= policy.max_retries => {
                return Err(FetchError::RetriesExhausted {
                    attempts: attempt + 1,
                    last: e.to_string(),
                });
            }
            Err(e) => {
                attempt += 1;
                let delay = policy.delay(attempt);
                tracing::debug!(url, attempt, delay_ms = delay.as_millis() as u64, error = %e, "Retrying");
                telemetry::increment(CounterMetric::FetchRetries);
                tokio::time::sleep(delay).await;
            }
        }
    }
}
