//! Configuration read by drivers and callers
//!
//! - [`DynamicConfigService`]: refreshable key/value settings, swapped
//!   atomically as a whole [`ConfigSnapshot`]
//! - [`SecretSource`]: provider secrets kept out of stored config
//! - [`merge_provider_config`]: stored provider config plus secrets

mod merge;
mod secrets;

pub use merge::merge_provider_config;
pub use secrets::{EnvSecretSource, SecretSource, StaticSecretSource, DEFAULT_SECRET_PREFIX};

use crate::error::{Result, RuntimeError};
use arc_swap::ArcSwap;
use atelie_repository::SystemConfigGateway;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Setting that overrides how long a snapshot stays fresh
pub const CACHE_TTL_KEY: &str = "CONFIG_CACHE_TTL_SECONDS";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Immutable view of all settings at one point in time
#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    values: HashMap<String, String>,
    loaded_at: Option<DateTime<Utc>>,
    version: u64,
}

impl ConfigSnapshot {
    pub fn new(values: HashMap<String, String>, version: u64) -> Self {
        Self {
            values,
            loaded_at: Some(Utc::now()),
            version,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Trimmed non-blank value
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn require_string(&self, key: &str) -> Result<&str> {
        self.get_string(key)
            .ok_or_else(|| RuntimeError::missing_config(key))
    }

    pub fn require_decimal(&self, key: &str) -> Result<f64> {
        let raw = self.require_string(key)?;
        raw.parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| RuntimeError::invalid_config(key, format!("'{}' is not a decimal", raw)))
    }

    pub fn require_bool(&self, key: &str) -> Result<bool> {
        let raw = self.require_string(key)?;
        match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(RuntimeError::invalid_config(key, format!("'{}' is not a boolean", raw))),
        }
    }

    /// Optional integer; present but malformed is an error
    pub fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        match self.get_string(key) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<i64>()
                .map(Some)
                .map_err(|_| RuntimeError::invalid_config(key, format!("'{}' is not an integer", raw))),
        }
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    /// Incremented on every refresh; 0 before the first load
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// TTL from `CONFIG_CACHE_TTL_SECONDS`, else `default_secs`
    fn ttl_secs(&self, default_secs: u64) -> u64 {
        self.get_string(CACHE_TTL_KEY)
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(default_secs)
    }

    fn is_stale(&self, now: DateTime<Utc>, default_ttl_secs: u64) -> bool {
        match self.loaded_at {
            None => true,
            Some(loaded_at) => (now - loaded_at).num_seconds() >= self.ttl_secs(default_ttl_secs) as i64,
        }
    }
}

/// Refreshable settings cache
///
/// Readers take an `Arc<ConfigSnapshot>` and never see a partially applied
/// refresh. Refreshes are serialized.
pub struct DynamicConfigService {
    gateway: Arc<dyn SystemConfigGateway>,
    snapshot: ArcSwap<ConfigSnapshot>,
    refresh_lock: Mutex<()>,
    default_ttl_secs: u64,
}

impl DynamicConfigService {
    /// Service with an empty snapshot; call [`refresh`](Self::refresh) to load
    pub fn new(gateway: Arc<dyn SystemConfigGateway>) -> Self {
        Self {
            gateway,
            snapshot: ArcSwap::from_pointee(ConfigSnapshot::default()),
            refresh_lock: Mutex::new(()),
            default_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }

    /// TTL used when the settings do not define `CONFIG_CACHE_TTL_SECONDS`
    pub fn with_default_ttl(mut self, secs: u64) -> Self {
        self.default_ttl_secs = secs;
        self
    }

    /// Create and load the first snapshot
    pub async fn load(gateway: Arc<dyn SystemConfigGateway>) -> Result<Self> {
        let service = Self::new(gateway);
        service.refresh().await?;
        Ok(service)
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        self.snapshot.load_full()
    }

    /// Reload every setting and swap the snapshot. On error the previous
    /// snapshot stays in place.
    pub async fn refresh(&self) -> Result<Arc<ConfigSnapshot>> {
        let _guard = self.refresh_lock.lock().await;

        let entries = self.gateway.load_all().await?;
        let values: HashMap<String, String> = entries.into_iter().map(|e| (e.key, e.value)).collect();
        let version = self.snapshot.load().version + 1;
        let next = Arc::new(ConfigSnapshot::new(values, version));

        self.snapshot.store(next.clone());
        tracing::info!("Config snapshot v{} loaded with {} keys", version, next.len());
        Ok(next)
    }

    /// Refresh only when the snapshot is older than its TTL. Returns whether
    /// a refresh happened.
    pub async fn refresh_if_stale(&self) -> Result<bool> {
        if !self.snapshot.load().is_stale(Utc::now(), self.default_ttl_secs) {
            return Ok(false);
        }
        self.refresh().await?;
        Ok(true)
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.snapshot.load().get_string(key).map(str::to_string)
    }

    pub fn require_string(&self, key: &str) -> Result<String> {
        self.snapshot.load().require_string(key).map(str::to_string)
    }

    pub fn require_decimal(&self, key: &str) -> Result<f64> {
        self.snapshot.load().require_decimal(key)
    }

    pub fn require_bool(&self, key: &str) -> Result<bool> {
        self.snapshot.load().require_bool(key)
    }

    pub fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        self.snapshot.load().get_i64(key)
    }
}

impl std::fmt::Debug for DynamicConfigService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot.load();
        f.debug_struct("DynamicConfigService")
            .field("version", &snapshot.version())
            .field("keys", &snapshot.len())
            .finish()
    }
}
