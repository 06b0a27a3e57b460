//! price-oracle: reference prices aggregated from exchange ticks
//!
//! This library provides the core components for:
//! - Caching the latest tick per exchange market
//! - Windowed median reducers and sequential trade chains
//! - A validated graph of per-pair price models
//! - Path-table orchestration over alternative conversion routes
//! - A single-writer oracle task shared by fetch workers
//! - Exchange polling with retry and backoff
//! - Structured logging and Prometheus metrics

pub mod aggregator;
pub mod cache;
pub mod cli;
pub mod config;
pub mod engine;
pub mod fetch;
pub mod graph;
pub mod pather;
pub mod price;
pub mod telemetry;
