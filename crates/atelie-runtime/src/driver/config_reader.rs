//! Typed access to a driver's merged config map

use crate::error::{Result, RuntimeError};
use atelie_core::model::digits_only;
use atelie_core::{Payload, Value};
use std::collections::HashMap;

/// Borrowing reader over a provider config
#[derive(Debug, Clone, Copy)]
pub struct ConfigReader<'a> {
    config: &'a Payload,
}

impl<'a> ConfigReader<'a> {
    pub fn new(config: &'a Payload) -> Self {
        Self { config }
    }

    /// Non-blank string value; numbers and booleans are rendered as text
    pub fn optional_str(&self, key: &str) -> Option<String> {
        self.config
            .get(key)
            .and_then(Value::to_display_string)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn require_str(&self, key: &str) -> Result<String> {
        self.optional_str(key)
            .ok_or_else(|| RuntimeError::missing_config(key))
    }

    /// Number or numeric string. Present but non-numeric is an error.
    pub fn optional_number(&self, key: &str) -> Result<Option<f64>> {
        match self.config.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(value) => value
                .to_number_lenient()
                .filter(|n| n.is_finite())
                .map(Some)
                .ok_or_else(|| {
                    RuntimeError::invalid_config(key, format!("expected a number, got {:?}", value))
                }),
        }
    }

    pub fn require_number(&self, key: &str) -> Result<f64> {
        self.optional_number(key)?
            .ok_or_else(|| RuntimeError::missing_config(key))
    }

    /// Boolean flag; accepts `true`/`false` and their string forms
    pub fn flag(&self, key: &str) -> bool {
        match self.config.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
            _ => false,
        }
    }

    /// List of digit-only prefixes given as an array or a comma separated string
    pub fn prefix_list(&self, key: &str) -> Vec<String> {
        let raw: Vec<String> = match self.config.get(key) {
            Some(Value::Array(items)) => items.iter().filter_map(Value::to_display_string).collect(),
            Some(value) => value
                .to_display_string()
                .map(|s| s.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
            None => Vec::new(),
        };

        raw.iter()
            .map(|p| digits_only(p))
            .filter(|p| !p.is_empty())
            .collect()
    }

    pub fn object(&self, key: &str) -> Option<&'a HashMap<String, Value>> {
        self.config.get(key).and_then(Value::as_object)
    }
}
