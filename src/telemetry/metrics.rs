//! Prometheus metrics

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Tick accepted by the oracle
    TicksIngested,
    /// Tick without a usable price
    TicksRejected,
    /// Fetch attempt retried after a failure
    FetchRetries,
    /// Fetch given up on or unparsable
    FetchFailures,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Leaf markets the fetch layer polls
    PolledSources,
    /// Pairs resolved in the last refresh round
    ResolvedPairs,
}

/// Increment a counter by one
pub fn increment(metric: CounterMetric) {
    let name = match metric {
        CounterMetric::TicksIngested => "oracle_ticks_ingested_total",
        CounterMetric::TicksRejected => "oracle_ticks_rejected_total",
        CounterMetric::FetchRetries => "oracle_fetch_retries_total",
        CounterMetric::FetchFailures => "oracle_fetch_failures_total",
    };
    ::metrics::counter!(name).increment(1);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let name = match metric {
        GaugeMetric::PolledSources => "oracle_polled_sources",
        GaugeMetric::ResolvedPairs => "oracle_resolved_pairs",
    };
    ::metrics::gauge!(name).set(value);
}

/// Record one resolution and its outcome (`None` on success)
pub fn record_resolve(elapsed: Duration, failure: Option<&'static str>) {
    ::metrics::histogram!("oracle_resolve_latency_ms").record(elapsed.as_secs_f64() * 1000.0);
    ::metrics::counter!("oracle_resolutions_total", "outcome" => failure.unwrap_or("ok"))
        .increment(1);
}

/// Serve metrics over HTTP on `port`
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(SocketAddr::from(([0, 0, 0, 0], port)))
        .install()
        .context("Failed to start Prometheus exporter")?;

    tracing::info!(port, "Metrics exporter listening");
    Ok(())
}
