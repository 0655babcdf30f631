// Runtime configuration for the aggregator and the `marketx` binary.
//
// Layering: built-in defaults, then an optional TOML file, then `MARKETX_*`
// environment variables (`MARKETX_ENDPOINTS__BINANCE=...` for nested keys).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::market_data::normaliser::MIN_QUOTE_VOLUME;
use crate::market_data::types::SourceId;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(8);
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(10);

pub const ENV_PREFIX: &str = "MARKETX";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Age after which a cached source snapshot is refetched.
    pub cache_ttl_ms: u64,
    /// Liquidity gate applied at normalization time.
    pub min_quote_volume: f64,
    /// Per-request HTTP timeout; a timeout reports as a network error.
    pub request_timeout_ms: u64,
    /// Overall deadline for one fan-out pass. `None` waits for every source.
    pub fan_out_deadline_ms: Option<u64>,
    /// Period of the scheduled `update_prices` pass in the binary.
    pub update_interval_ms: u64,
    pub endpoints: Endpoints,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: DEFAULT_CACHE_TTL.as_millis() as u64,
            min_quote_volume: MIN_QUOTE_VOLUME,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
            fan_out_deadline_ms: None,
            update_interval_ms: DEFAULT_UPDATE_INTERVAL.as_millis() as u64,
            endpoints: Endpoints::default(),
        }
    }
}

impl AggregatorConfig {
    /// Load defaults, then `path` (if it exists), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn fan_out_deadline(&self) -> Option<Duration> {
        self.fan_out_deadline_ms.map(Duration::from_millis)
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }
}

/// Base URLs of the public REST APIs. Overridable for mirrors and tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub binance: String,
    pub bybit: String,
    pub bitget: String,
    pub hyperliquid: String,
    pub okx: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            binance: "https://api.binance.com".into(),
            bybit: "https://api.bybit.com".into(),
            bitget: "https://api.bitget.com".into(),
            hyperliquid: "https://api.hyperliquid.xyz".into(),
            okx: "https://www.okx.com".into(),
        }
    }
}

impl Endpoints {
    pub fn base_url(&self, source: SourceId) -> &str {
        let url = match source {
            SourceId::Binance => &self.binance,
            SourceId::Bybit => &self.bybit,
            SourceId::Bitget => &self.bitget,
            SourceId::Hyperliquid => &self.hyperliquid,
            SourceId::Okx => &self.okx,
        };
        url.trim_end_matches('/')
    }
}
