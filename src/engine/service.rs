//! Single-writer oracle task
//!
//! All ingestion and aggregation for one [`Oracle`] runs on one tokio task
//! draining a bounded command queue. Handles are cheap to clone and can be
//! given to any number of producers.

use tokio::sync::{mpsc, oneshot};

use super::{EngineError, Oracle};
use crate::graph::ResolveError;
use crate::price::{ExchangePair, Pair, PriceAggregate, PricePoint};

/// Commands accepted by the oracle task
enum Command {
    Ingest(PricePoint),
    Resolve {
        pair: Pair,
        reply: oneshot::Sender<Result<PriceAggregate, ResolveError>>,
    },
    AggregatePaths {
        pair: Pair,
        reply: oneshot::Sender<Option<PriceAggregate>>,
    },
    Sources {
        pair: Option<Pair>,
        reply: oneshot::Sender<Vec<ExchangePair>>,
    },
}

/// Owner of the oracle task
pub struct OracleService;

impl OracleService {
    /// Move `oracle` into its own task and return a handle to it
    ///
    /// The task stops once every handle is dropped.
    pub fn spawn(oracle: Oracle, queue_depth: usize) -> OracleHandle {
        let (tx, rx) = mpsc::channel(queue_depth.max(1));
        tokio::spawn(Self::run_loop(oracle, rx));
        OracleHandle { tx }
    }

    async fn run_loop(mut oracle: Oracle, mut rx: mpsc::Receiver<Command>) {
        tracing::info!(models = oracle.models().len(), "Oracle task started");

        while let Some(command) = rx.recv().await {
            match command {
                Command::Ingest(point) => oracle.ingest(point),
                Command::Resolve { pair, reply } => {
                    let _ = reply.send(oracle.resolve(&pair));
                }
                Command::AggregatePaths { pair, reply } => {
                    let _ = reply.send(oracle.aggregate_paths(&pair));
                }
                Command::Sources { pair, reply } => {
                    let sources = match pair {
                        Some(pair) => oracle.sources(&pair),
                        None => oracle.all_sources(),
                    };
                    let _ = reply.send(sources);
                }
            }
        }

        tracing::info!("Oracle task stopped");
    }
}

/// Cloneable access to an oracle task
#[derive(Clone)]
pub struct OracleHandle {
    tx: mpsc::Sender<Command>,
}

impl OracleHandle {
    /// Queue a tick; waits while the queue is full
    pub async fn ingest(&self, point: PricePoint) -> Result<(), EngineError> {
        self.tx
            .send(Command::Ingest(point))
            .await
            .map_err(|_| EngineError::Stopped)
    }

    /// Resolve `pair` through the model graph
    pub async fn resolve(&self, pair: Pair) -> Result<Result<PriceAggregate, ResolveError>, EngineError> {
        self.request(|reply| Command::Resolve { pair, reply }).await
    }

    /// Aggregate `pair` through the path table
    pub async fn aggregate_paths(&self, pair: Pair) -> Result<Option<PriceAggregate>, EngineError> {
        self.request(|reply| Command::AggregatePaths { pair, reply })
            .await
    }

    /// Leaf markets for `pair`, or for every model when `None`
    pub async fn sources(&self, pair: Option<Pair>) -> Result<Vec<ExchangePair>, EngineError> {
        self.request(|reply| Command::Sources { pair, reply }).await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| EngineError::Stopped)?;
        reply_rx.await.map_err(|_| EngineError::Stopped)
    }
}
