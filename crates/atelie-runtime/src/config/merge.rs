//! Provider config merge

use crate::error::{Result, RuntimeError};
use atelie_core::types::payload_from_json;
use atelie_core::{Payload, Value};

/// Build the config map a driver receives.
///
/// Starts from the stored config JSON (absent or blank means `{}`), overlays
/// `secrets` (secrets win on collisions) and fills `provider_code` when the
/// stored config does not set it.
pub fn merge_provider_config(provider_code: &str, stored_json: Option<&str>, secrets: Payload) -> Result<Payload> {
    let mut config = match stored_json.map(str::trim).filter(|json| !json.is_empty()) {
        None => Payload::new(),
        Some(json) => {
            let parsed: serde_json::Value = serde_json::from_str(json).map_err(|e| {
                RuntimeError::invalid_config("config_json", format!("{} for provider {}", e, provider_code))
            })?;
            payload_from_json(parsed).ok_or_else(|| {
                RuntimeError::invalid_config(
                    "config_json",
                    format!("config of provider {} is not a JSON object", provider_code),
                )
            })?
        }
    };

    config.extend(secrets);
    config
        .entry("provider_code".to_string())
        .or_insert_with(|| Value::from(provider_code));
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_override_stored_values() {
        let mut secrets = Payload::new();
        secrets.insert("auth_token".into(), Value::from("from-env"));

        let config = merge_provider_config(
            "HOOK",
            Some(r#"{"url":"https://hook.example.com","auth_token":"stored"}"#),
            secrets,
        )
        .unwrap();

        assert_eq!(config.get("auth_token"), Some(&Value::from("from-env")));
        assert_eq!(config.get("url"), Some(&Value::from("https://hook.example.com")));
        assert_eq!(config.get("provider_code"), Some(&Value::from("HOOK")));
    }

    #[test]
    fn test_missing_config_is_empty() {
        let config = merge_provider_config("J3", None, Payload::new()).unwrap();
        assert_eq!(config.len(), 1);

        let config = merge_provider_config("J3", Some("  "), Payload::new()).unwrap();
        assert_eq!(config.len(), 1);
    }

    #[test]
    fn test_stored_provider_code_is_kept() {
        let config = merge_provider_config("J3", Some(r#"{"provider_code":"J3_EXPRESS"}"#), Payload::new()).unwrap();
        assert_eq!(config.get("provider_code"), Some(&Value::from("J3_EXPRESS")));
    }

    #[test]
    fn test_non_object_config_is_invalid() {
        for json in ["[1,2]", "not json", "42"] {
            let err = merge_provider_config("J3", Some(json), Payload::new()).unwrap_err();
            assert!(matches!(err, RuntimeError::InvalidConfig { ref key, .. } if key == "config_json"));
        }
    }
}
