use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// The root configuration structure for the dashboard data core.
///
/// Every section falls back to its defaults, so an empty (or missing)
/// `dashboard.toml` yields a usable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub client: ClientConfig,
    pub cache: CacheSettings,
    pub validation: ValidationSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Rejects values that would make the core unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "client.timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.client.concurrency_limit == 0 {
            return Err(ConfigError::ValidationError(
                "client.concurrency_limit must be greater than zero".to_string(),
            ));
        }
        if self.client.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError("client.base_url is empty".to_string()));
        }
        if self.validation.starting_capital <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "validation.starting_capital must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parameters for the request orchestrator and HTTP client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Root of the game API, e.g. "https://api.example.com/v1".
    pub base_url: String,
    /// Per-attempt timeout.
    pub timeout_ms: u64,
    /// How many times a retryable failure is retried after the first attempt.
    pub max_retries: u32,
    /// Base of the exponential backoff (`base * 2^retry + jitter`).
    pub base_retry_delay_ms: u64,
    /// Upper bound of any single backoff delay.
    pub max_retry_delay_ms: u64,
    /// Upper bound (exclusive) of the random jitter added to each delay.
    pub max_jitter_ms: u64,
    /// Maximum number of logical requests in flight; excess requests are rejected.
    pub concurrency_limit: usize,
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn base_retry_delay(&self) -> Duration {
        Duration::from_millis(self.base_retry_delay_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout_ms: 10_000,
            max_retries: 3,
            base_retry_delay_ms: 1_000,
            max_retry_delay_ms: 10_000,
            max_jitter_ms: 1_000,
            concurrency_limit: 5,
        }
    }
}

/// Capacity settings for one cache namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct NamespaceSettings {
    pub max_entries: usize,
}

/// Parameters for the cache store.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Time-to-live applied when a write does not specify one.
    pub ttl_ms: u64,
    /// Capacity of namespaces not listed in `namespaces`.
    pub default_max_entries: usize,
    pub namespaces: HashMap<String, NamespaceSettings>,
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    /// The capacity configured for `namespace`.
    pub fn max_entries_for(&self, namespace: &str) -> usize {
        self.namespaces
            .get(namespace)
            .map(|ns| ns.max_entries)
            .unwrap_or(self.default_max_entries)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        let namespaces = HashMap::from([
            ("dashboard".to_string(), NamespaceSettings { max_entries: 200 }),
            ("leaderboard".to_string(), NamespaceSettings { max_entries: 20 }),
        ]);
        Self {
            ttl_ms: 60_000,
            default_max_entries: 100,
            namespaces,
        }
    }
}

/// Parameters for leaderboard record validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// The capital every player starts the game with. Used by the pnl consistency checks.
    pub starting_capital: Decimal,
    /// Largest tolerated gap between `pnl` and `portfolio_value - starting_capital`.
    pub pnl_tolerance: Decimal,
    /// Largest tolerated gap between `pnl_percent` and the percentage derived from `pnl`.
    pub pnl_percent_tolerance: Decimal,
    /// Whether a record must carry the API-reported rank to be accepted.
    pub require_rank: bool,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            starting_capital: dec!(100000),
            pnl_tolerance: dec!(1000),
            pnl_percent_tolerance: dec!(0.1),
            require_rank: true,
        }
    }
}

/// Output format of the console log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
}

/// Parameters for the tracing subscriber.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            directory: None,
        }
    }
}
