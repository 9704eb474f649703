//! Configuration types for fintap

use regex::Regex;
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::TapError;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub shard: ShardConfig,
    #[serde(default)]
    pub http: HttpConfig,
    pub polygon: Option<PolygonConfig>,
    pub coingecko: Option<CoingeckoConfig>,
    pub eodhd: Option<EodhdConfig>,
    pub target: Option<TargetConfig>,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Workload sharding across cooperating worker processes
#[derive(Debug, Clone, Deserialize)]
pub struct ShardConfig {
    /// This worker's shard index, in `[0, count)`
    #[serde(default)]
    pub id: u32,

    /// Total number of cooperating workers
    #[serde(default = "default_shard_count")]
    pub count: u32,
}

fn default_shard_count() -> u32 {
    1
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self { id: 0, count: 1 }
    }
}

/// HTTP client configuration shared by all taps
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// Polygon tap configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PolygonConfig {
    pub api_key: String,

    /// Extra stock symbols to load besides snapshot discovery
    #[serde(default)]
    pub stock_symbols: Vec<String>,

    /// Option contracts to load
    #[serde(default)]
    pub option_contract_names: Vec<String>,

    /// Extra crypto symbols to load besides snapshot discovery
    #[serde(default)]
    pub crypto_symbols: Vec<String>,

    #[serde(default = "default_polygon_base_url")]
    pub base_url: String,
}

fn default_polygon_base_url() -> String {
    "https://api.polygon.io".to_string()
}

/// CoinGecko tap configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CoingeckoConfig {
    /// Coin ids to load; empty means discover via the coins list endpoint
    #[serde(default)]
    pub coins: Vec<String>,

    /// Cap on the number of discovered coins (sorted by id)
    pub coins_limit: Option<usize>,

    #[serde(default = "default_coingecko_base_url")]
    pub base_url: String,
}

fn default_coingecko_base_url() -> String {
    "https://api.coingecko.com/api".to_string()
}

impl Default for CoingeckoConfig {
    fn default() -> Self {
        Self {
            coins: Vec::new(),
            coins_limit: None,
            base_url: default_coingecko_base_url(),
        }
    }
}

/// EOD Historical Data tap configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EodhdConfig {
    pub api_token: String,

    /// Symbols to load, processed in sorted order
    pub symbols: Vec<String>,

    /// Restart the run from this symbol instead of the state cursor
    pub start_symbol: Option<String>,

    #[serde(default = "default_eodhd_base_url")]
    pub base_url: String,
}

fn default_eodhd_base_url() -> String {
    "https://eodhistoricaldata.com/api".to_string()
}

/// Search-index target configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Application id of the search index
    pub app_id: String,

    /// API key with write and settings permissions
    pub api_key: String,

    /// TOML file mapping streams to indexes
    pub index_mapping_file: PathBuf,

    /// Override the index endpoint (defaults to the hosted endpoint for `app_id`)
    pub base_url: Option<String>,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// Prometheus exporter port; 0 disables the exporter
    #[serde(default)]
    pub metrics_port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_port: 0,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, resolving `${VAR}` references
    /// against the environment first.
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let resolved = resolve_env(content);
        let config: Config = toml::from_str(&resolved)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.shard.count == 0 {
            anyhow::bail!("shard.count must be at least 1");
        }
        if self.shard.id >= self.shard.count {
            anyhow::bail!(
                "shard.id {} out of range for shard.count {}",
                self.shard.id,
                self.shard.count
            );
        }
        Ok(())
    }

    /// Polygon section, or a config error naming the missing table.
    pub fn polygon(&self) -> Result<&PolygonConfig, TapError> {
        self.polygon
            .as_ref()
            .ok_or_else(|| TapError::Config("missing [polygon] section".to_string()))
    }

    /// CoinGecko section, or a config error naming the missing table.
    pub fn coingecko(&self) -> Result<&CoingeckoConfig, TapError> {
        self.coingecko
            .as_ref()
            .ok_or_else(|| TapError::Config("missing [coingecko] section".to_string()))
    }

    /// EODHD section, or a config error naming the missing table.
    pub fn eodhd(&self) -> Result<&EodhdConfig, TapError> {
        self.eodhd
            .as_ref()
            .ok_or_else(|| TapError::Config("missing [eodhd] section".to_string()))
    }

    /// Target section, or a config error naming the missing table.
    pub fn target(&self) -> Result<&TargetConfig, TapError> {
        self.target
            .as_ref()
            .ok_or_else(|| TapError::Config("missing [target] section".to_string()))
    }
}

/// Replace `${VAR}` references with values from the environment.
///
/// Unset variables resolve to the bare variable name, so a missing secret
/// surfaces as an obviously-wrong literal instead of an empty string.
pub fn resolve_env(text: &str) -> String {
    let pattern = Regex::new(r"\$\{([^}{]+)\}").expect("static pattern");
    pattern
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            std::env::var(name).unwrap_or_else(|_| name.to_string())
        })
        .into_owned()
}
