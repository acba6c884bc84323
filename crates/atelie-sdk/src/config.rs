//! Configuration types for the routing engine

use crate::error::{Result, SdkError};
use atelie_runtime::config::DEFAULT_SECRET_PREFIX;
use atelie_runtime::driver::{FLAT_RATE_PROVIDER, FLAT_RATE_SHIPPING_KEY};
use atelie_runtime::HttpSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_ENVIRONMENT: &str = "production";

/// Main engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Environment whose provider configs and secrets are used when the
    /// caller does not name one
    pub environment: String,

    /// Upper bound for one driver call, on top of the HTTP timeouts
    pub driver_timeout_ms: u64,

    /// Prefix of provider secret environment variables
    pub secret_prefix: String,

    /// Outbound HTTP timeouts for webhook drivers
    pub http: HttpSettings,

    /// Shipping contingency provider
    pub contingency: ContingencyConfig,

    /// Default freshness of the settings snapshot
    pub config_ttl_secs: u64,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            environment: DEFAULT_ENVIRONMENT.to_string(),
            driver_timeout_ms: 15_000,
            secret_prefix: DEFAULT_SECRET_PREFIX.to_string(),
            http: HttpSettings::default(),
            contingency: ContingencyConfig::default(),
            config_ttl_secs: 300,
        }
    }

    /// Load from `.env`, `config/atelie.*` and `ATELIE__*` environment
    /// variables, in increasing precedence
    ///
    /// `ATELIE__CONTINGENCY__RATE=19.9` sets `contingency.rate`.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config_result = config::Config::builder()
            .add_source(config::File::with_name("config/atelie").required(false))
            .add_source(config::Environment::with_prefix("ATELIE").separator("__"))
            .build();

        match config_result {
            Ok(cfg) => cfg
                .try_deserialize()
                .map_err(|e| SdkError::ConfigError(format!("Failed to deserialize config: {}", e))),
            Err(e) => {
                tracing::info!("No engine config found ({}), using defaults", e);
                Ok(Self::default())
            }
        }
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn with_driver_timeout(mut self, timeout: Duration) -> Self {
        self.driver_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_secret_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.secret_prefix = prefix.into();
        self
    }

    pub fn with_http(mut self, http: HttpSettings) -> Self {
        self.http = http;
        self
    }

    pub fn with_contingency(mut self, contingency: ContingencyConfig) -> Self {
        self.contingency = contingency;
        self
    }

    pub fn driver_timeout(&self) -> Duration {
        Duration::from_millis(self.driver_timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Reserved provider used when no shipping provider succeeds
///
/// `rate` and `free_threshold` are the lowest layer of the contingency
/// config: the `FLAT_RATE` and `FLAT_FREE_SHIPPING_THRESHOLD` settings and
/// the provider's own stored config override them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContingencyConfig {
    pub provider_code: String,
    pub driver_key: String,
    pub rate: Option<f64>,
    pub free_threshold: Option<f64>,
}

impl ContingencyConfig {
    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn with_free_threshold(mut self, threshold: f64) -> Self {
        self.free_threshold = Some(threshold);
        self
    }
}

impl Default for ContingencyConfig {
    fn default() -> Self {
        Self {
            provider_code: FLAT_RATE_PROVIDER.to_string(),
            driver_key: FLAT_RATE_SHIPPING_KEY.to_string(),
            rate: None,
            free_threshold: None,
        }
    }
}
