//! Provider secrets
//!
//! Tokens and credentials live in the process environment rather than in
//! stored provider config. For provider `J3` in environment `production`:
//!
//! ```text
//! ATELIE_SECRET_J3_AUTH_TOKEN=...              -> auth_token (any environment)
//! ATELIE_SECRET_PRODUCTION_J3_AUTH_TOKEN=...   -> auth_token (production only, wins)
//! ```

use atelie_core::{Payload, Value};
use std::collections::HashMap;

pub const DEFAULT_SECRET_PREFIX: &str = "ATELIE_SECRET";

/// Source of per-provider, per-environment secrets
pub trait SecretSource: Send + Sync {
    fn secrets_for(&self, provider_code: &str, environment: &str) -> Payload;
}

/// Reads secrets from environment variables
#[derive(Debug, Clone)]
pub struct EnvSecretSource {
    prefix: String,
}

impl EnvSecretSource {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Collect the secrets of one provider out of `vars`
    pub fn collect<I>(prefix: &str, provider_code: &str, environment: &str, vars: I) -> Payload
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let general = format!("{}_{}_", prefix, env_segment(provider_code));
        let scoped = format!("{}_{}_{}_", prefix, env_segment(environment), env_segment(provider_code));

        let mut secrets = Payload::new();
        let mut scoped_secrets = Payload::new();
        for (name, value) in vars {
            if let Some(key) = name.strip_prefix(&scoped) {
                scoped_secrets.insert(key.to_lowercase(), Value::String(value));
            } else if let Some(key) = name.strip_prefix(&general) {
                secrets.insert(key.to_lowercase(), Value::String(value));
            }
        }

        secrets.extend(scoped_secrets);
        secrets
    }
}

impl Default for EnvSecretSource {
    fn default() -> Self {
        Self::new(DEFAULT_SECRET_PREFIX)
    }
}

impl SecretSource for EnvSecretSource {
    fn secrets_for(&self, provider_code: &str, environment: &str) -> Payload {
        let secrets = Self::collect(&self.prefix, provider_code, environment, std::env::vars());
        if !secrets.is_empty() {
            tracing::debug!(
                "Found {} secret(s) for provider {} in {}",
                secrets.len(),
                provider_code,
                environment
            );
        }
        secrets
    }
}

/// Uppercase with every non-alphanumeric character turned into `_`
fn env_segment(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

/// Fixed secrets, for tests and embedded use
#[derive(Debug, Clone, Default)]
pub struct StaticSecretSource {
    general: HashMap<String, Payload>,
    scoped: HashMap<(String, String), Payload>,
}

impl StaticSecretSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Secret for every environment
    pub fn with_secret(mut self, provider_code: &str, key: &str, value: impl Into<Value>) -> Self {
        self.general
            .entry(provider_code.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
        self
    }

    /// Secret for one environment only
    pub fn with_scoped_secret(
        mut self,
        environment: &str,
        provider_code: &str,
        key: &str,
        value: impl Into<Value>,
    ) -> Self {
        self.scoped
            .entry((environment.to_string(), provider_code.to_string()))
            .or_default()
            .insert(key.to_string(), value.into());
        self
    }
}

impl SecretSource for StaticSecretSource {
    fn secrets_for(&self, provider_code: &str, environment: &str) -> Payload {
        let mut secrets = self.general.get(provider_code).cloned().unwrap_or_default();
        if let Some(scoped) = self
            .scoped
            .get(&(environment.to_string(), provider_code.to_string()))
        {
            secrets.extend(scoped.clone());
        }
        secrets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_collect_general_and_scoped() {
        let secrets = EnvSecretSource::collect(
            "ATELIE_SECRET",
            "J3",
            "production",
            vars(&[
                ("ATELIE_SECRET_J3_AUTH_TOKEN", "general-token"),
                ("ATELIE_SECRET_J3_URL", "https://j3.example.com"),
                ("ATELIE_SECRET_PRODUCTION_J3_AUTH_TOKEN", "prod-token"),
                ("ATELIE_SECRET_SANDBOX_J3_AUTH_TOKEN", "sandbox-token"),
                ("ATELIE_SECRET_MP_AUTH_TOKEN", "other"),
                ("PATH", "/usr/bin"),
            ]),
        );

        assert_eq!(secrets.len(), 2);
        assert_eq!(secrets.get("auth_token"), Some(&Value::from("prod-token")));
        assert_eq!(secrets.get("url"), Some(&Value::from("https://j3.example.com")));
    }

    #[test]
    fn test_numeric_looking_tokens_stay_strings() {
        let secrets = EnvSecretSource::collect(
            "ATELIE_SECRET",
            "mercado-pago",
            "prod",
            vars(&[("ATELIE_SECRET_MERCADO_PAGO_AUTH_TOKEN", "123456789012345678901234")]),
        );
        assert_eq!(
            secrets.get("auth_token"),
            Some(&Value::from("123456789012345678901234"))
        );
    }

    #[test]
    fn test_static_source() {
        let source = StaticSecretSource::new()
            .with_secret("HOOK", "auth_token", "any")
            .with_scoped_secret("prod", "HOOK", "auth_token", "prod-only");

        assert_eq!(
            source.secrets_for("HOOK", "prod").get("auth_token"),
            Some(&Value::from("prod-only"))
        );
        assert_eq!(
            source.secrets_for("HOOK", "dev").get("auth_token"),
            Some(&Value::from("any"))
        );
        assert!(source.secrets_for("OTHER", "prod").is_empty());
    }
}
