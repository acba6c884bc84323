//! Terminal outcome of one resolution and execution

use super::rule_match::MatchReason;
use crate::types::{Payload, Value};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error code returned when every candidate provider was exhausted
pub const NO_PROVIDER_AVAILABLE: &str = "no_provider_available";

const UNKNOWN_ERROR: &str = "unknown_error";

/// Key every successful payload carries to identify who served it
pub const PROVIDER_MARKER: &str = "provider";

/// What happened to one provider during resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// A rule declined the request, or every rule of the provider was broken
    Ineligible { reasons: Vec<MatchReason> },
    DriverNotFound { driver_key: String },
    UnsupportedServiceType { driver_key: String },
    /// Stored configuration could not be used
    ConfigurationError { message: String },
    Failed { message: String },
    TimedOut { after_ms: u64 },
    Succeeded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderAttempt {
    pub provider_code: String,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

impl ProviderAttempt {
    pub fn new(provider_code: impl Into<String>, outcome: AttemptOutcome) -> Self {
        Self {
            provider_code: provider_code.into(),
            outcome,
        }
    }

    /// True when the provider was selected and its driver actually ran
    pub fn was_executed(&self) -> bool {
        matches!(
            self.outcome,
            AttemptOutcome::Failed { .. } | AttemptOutcome::TimedOut { .. } | AttemptOutcome::Succeeded
        )
    }
}

/// Rule that made the serving provider eligible
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedRule {
    pub rule_id: Uuid,
    pub reason: MatchReason,
    /// Passed through verbatim, never interpreted
    pub behavior_json: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceResult {
    pub success: bool,
    pub provider_code: Option<String>,
    #[serde(default)]
    pub payload: Payload,
    /// Machine readable error code. Always present and non-empty on failure.
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_rule: Option<MatchedRule>,
    #[serde(default)]
    pub attempts: Vec<ProviderAttempt>,
}

impl ServiceResult {
    /// Successful result. The payload gets a `provider` marker if the driver
    /// did not set one.
    pub fn success(provider_code: impl Into<String>, mut payload: Payload) -> Self {
        let provider_code = provider_code.into();
        payload
            .entry(PROVIDER_MARKER.to_string())
            .or_insert_with(|| Value::String(provider_code.clone()));

        Self {
            success: true,
            provider_code: Some(provider_code),
            payload,
            error: None,
            message: None,
            matched_rule: None,
            attempts: Vec::new(),
        }
    }

    /// Failed result. A blank code is replaced so `error` is never empty.
    pub fn failure(error: impl Into<String>) -> Self {
        let error = error.into();
        let error = if error.trim().is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            error
        };

        Self {
            success: false,
            provider_code: None,
            payload: Payload::new(),
            error: Some(error),
            message: None,
            matched_rule: None,
            attempts: Vec::new(),
        }
    }

    pub fn no_provider_available() -> Self {
        Self::failure(NO_PROVIDER_AVAILABLE)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_matched_rule(mut self, matched_rule: Option<MatchedRule>) -> Self {
        self.matched_rule = matched_rule;
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_attempts(mut self, attempts: Vec<ProviderAttempt>) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn error_code(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Typed payload accessor
    pub fn payload_value(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }
}
