//! Configuration types for price-oracle

use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::price::Pair;
use crate::telemetry::LogFormat;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub exchanges: Vec<ExchangeConfig>,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Oracle engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Price model document (JSON)
    pub models: PathBuf,

    /// Optional path table document (JSON)
    #[serde(default)]
    pub paths: Option<PathBuf>,

    /// Pairs reported by `run`; every model when empty
    #[serde(default)]
    pub pairs: Vec<Pair>,

    /// Freshness window of the cache and the path reducers (seconds)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Oracle task command queue depth
    #[serde(default = "default_engine_queue_depth")]
    pub queue_depth: usize,
}

/// Longest accepted freshness window: 30 days
pub const MAX_WINDOW_SECS: u64 = 30 * 24 * 60 * 60;

fn default_window_secs() -> u64 {
    60
}
fn default_engine_queue_depth() -> usize {
    1024
}

impl EngineConfig {
    /// Freshness window as a duration
    ///
    /// Clamped to `1..=MAX_WINDOW_SECS`; [`Config::validate`] rejects values
    /// outside that range.
    pub fn window(&self) -> chrono::Duration {
        let secs = self.window_secs.clamp(1, MAX_WINDOW_SECS);
        chrono::Duration::seconds(i64::try_from(secs).unwrap_or(1))
    }
}

/// Fetch pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Concurrent fetch workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Pending request queue depth
    #[serde(default = "default_fetch_queue_depth")]
    pub queue_depth: usize,

    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First retry delay (milliseconds)
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Retry delay cap (milliseconds)
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Polling interval of `run` (seconds)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_workers() -> usize {
    4
}
fn default_fetch_queue_depth() -> usize {
    64
}
fn default_max_retries() -> u32 {
    3
}
fn default_initial_backoff_ms() -> u64 {
    200
}
fn default_max_backoff_ms() -> u64 {
    5000
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_interval_secs() -> u64 {
    30
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_depth: default_fetch_queue_depth(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            timeout_secs: default_timeout_secs(),
            interval_secs: default_interval_secs(),
        }
    }
}

/// One polled exchange
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    pub name: String,
    /// Ticker endpoint; `{base}` and `{quote}` are substituted
    pub url_template: String,
    /// Free-form settings carried on the exchange
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Prometheus exporter port; disabled when absent
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Relative document paths are taken relative to the file's directory.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;

        if let Some(dir) = path.parent() {
            config.engine.models = dir.join(&config.engine.models);
            config.engine.paths = config.engine.paths.map(|p| dir.join(p));
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot work together
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(1..=MAX_WINDOW_SECS).contains(&self.engine.window_secs) {
            anyhow::bail!(
                "engine.window_secs ({}) must be between 1 and {}",
                self.engine.window_secs,
                MAX_WINDOW_SECS
            );
        }

        if self.fetch.max_backoff_ms < self.fetch.initial_backoff_ms {
            anyhow::bail!(
                "fetch.max_backoff_ms ({}) is below fetch.initial_backoff_ms ({})",
                self.fetch.max_backoff_ms,
                self.fetch.initial_backoff_ms
            );
        }

        let mut names: Vec<&str> = self.exchanges.iter().map(|e| e.name.as_str()).collect();
        names.sort_unstable();
        if let Some(dup) = names.windows(2).find(|w| w[0] == w[1]) {
            anyhow::bail!("Exchange {} configured twice", dup[0]);
        }

        Ok(())
    }
}
