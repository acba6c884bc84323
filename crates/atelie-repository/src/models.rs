//! Stored shapes of providers, rules and configuration

use atelie_core::{ServiceProvider, ServiceRoutingRule, ServiceType, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

use crate::error::{RepositoryError, RepositoryResult};

/// One versioned provider configuration for an environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfigRecord {
    pub provider_code: String,
    pub environment: String,
    /// Raw JSON object as stored
    pub config_json: String,
    pub version: i32,
}

impl ProviderConfigRecord {
    pub fn new(
        provider_code: impl Into<String>,
        environment: impl Into<String>,
        config_json: impl Into<String>,
    ) -> Self {
        Self {
            provider_code: provider_code.into(),
            environment: environment.into(),
            config_json: config_json.into(),
            version: 1,
        }
    }

    pub fn with_version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }
}

/// A system-wide key/value setting (rates, thresholds, feature switches)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfigEntry {
    pub key: String,
    pub value: String,
}

impl SystemConfigEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_priority() -> i32 {
    100
}

fn default_version() -> i32 {
    1
}

/// Rule as written in a catalog file. `match` and `behavior` may be given
/// either as JSON text or as a nested mapping.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleRecord {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub service_type: ServiceType,
    pub provider_code: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(rename = "match", default)]
    pub match_doc: Option<serde_json::Value>,
    #[serde(default)]
    pub behavior: Option<serde_json::Value>,
}

impl RuleRecord {
    pub fn into_rule(self) -> ServiceRoutingRule {
        ServiceRoutingRule {
            id: self.id,
            service_type: self.service_type,
            provider_code: self.provider_code,
            enabled: self.enabled,
            priority: self.priority,
            match_json: self.match_doc.map(json_text).unwrap_or_else(|| "{}".to_string()),
            behavior_json: self.behavior.map(json_text),
        }
    }
}

/// Provider configuration as written in a catalog file
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfigEntry {
    pub provider_code: String,
    pub environment: String,
    #[serde(default = "default_version")]
    pub version: i32,
    pub config: serde_json::Value,
}

impl ProviderConfigEntry {
    pub fn into_record(self) -> ProviderConfigRecord {
        ProviderConfigRecord {
            provider_code: self.provider_code,
            environment: self.environment,
            config_json: json_text(self.config),
            version: self.version,
        }
    }
}

/// Whole catalog document: what a file or a seed script provides
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub providers: Vec<ServiceProvider>,
    #[serde(default)]
    pub rules: Vec<RuleRecord>,
    #[serde(default)]
    pub provider_configs: Vec<ProviderConfigEntry>,
    #[serde(default)]
    pub settings: BTreeMap<String, serde_json::Value>,
}

impl CatalogDocument {
    /// Reject duplicate provider codes within a service type and warn about
    /// rules pointing at providers that do not exist
    pub fn validate(&self) -> RepositoryResult<()> {
        let mut seen = HashSet::new();
        for provider in &self.providers {
            if !seen.insert((provider.service_type, provider.code.as_str())) {
                return Err(RepositoryError::InvalidCatalog(format!(
                    "duplicate provider code '{}' for {}",
                    provider.code, provider.service_type
                )));
            }
        }

        for rule in &self.rules {
            if !seen.contains(&(rule.service_type, rule.provider_code.as_str())) {
                tracing::warn!(
                    "Rule {} references unknown provider '{}' for {}",
                    rule.id,
                    rule.provider_code,
                    rule.service_type
                );
            }
        }

        Ok(())
    }

    pub fn setting_entries(&self) -> Vec<SystemConfigEntry> {
        self.settings
            .iter()
            .map(|(key, value)| {
                let text = Value::from(value.clone())
                    .to_display_string()
                    .unwrap_or_else(|| value.to_string());
                SystemConfigEntry::new(key.clone(), text)
            })
            .collect()
    }
}

fn json_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}
