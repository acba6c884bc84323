//! Service drivers
//!
//! A driver is the adapter that talks to one kind of provider integration.
//! Providers reference drivers by `driver_key`; the [`DriverRegistry`] maps
//! keys to implementations.
//!
//! Drivers report failure through [`DriverFailure`] rather than an in-band
//! `{"error": true}` map. [`DriverFailure::to_payload`] renders that map for
//! callers that still expect it.

mod config_reader;
mod http;
mod registry;
mod shipping;
mod webhook;

pub use config_reader::ConfigReader;
pub use http::{HttpClient, HttpResponse, HttpSettings, ReqwestHttpClient};
pub use registry::DriverRegistry;
pub use shipping::{
    FlatRateShippingDriver, ZoneShippingDriver, FLAT_RATE_PROVIDER, FLAT_RATE_SHIPPING_KEY,
    J3_SHIPPING_KEY, ZONE_SHIPPING_KEY,
};
pub use webhook::{GenericWebhookDriver, GENERIC_WEBHOOK_KEY, NOTIFICATION_WEBHOOK_KEY};

use crate::error::RuntimeError;
use async_trait::async_trait;
use atelie_core::{Payload, ServiceType, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a driver call produced
pub type DriverOutcome = std::result::Result<Payload, DriverFailure>;

/// Failure category of a driver call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Connection refused, DNS, TLS and similar
    Transport,
    Timeout,
    /// The provider answered with something that is not a usable JSON object
    InvalidResponse,
    /// The request lacks data the driver needs
    InvalidRequest,
    /// Provider config is missing or unusable
    Configuration,
    /// The provider answered and declined the request
    Rejected,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Transport => "transport",
            FailureKind::Timeout => "timeout",
            FailureKind::InvalidResponse => "invalid_response",
            FailureKind::InvalidRequest => "invalid_request",
            FailureKind::Configuration => "configuration",
            FailureKind::Rejected => "rejected",
        }
    }
}

/// Typed driver failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl DriverFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            kind.as_str().to_string()
        } else {
            message
        };
        Self { kind, message }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Transport, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Timeout, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(FailureKind::InvalidResponse, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(FailureKind::InvalidRequest, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Configuration, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Rejected, message)
    }

    /// `{"error": true, "message": .., "kind": ..}`
    pub fn to_payload(&self) -> Payload {
        let mut payload = Payload::new();
        payload.insert("error".to_string(), Value::Bool(true));
        payload.insert("message".to_string(), Value::String(self.message.clone()));
        payload.insert("kind".to_string(), Value::from(self.kind.as_str()));
        payload
    }

    /// Recognize an in-band error map (`"error": true`) returned by a provider
    pub fn from_payload(payload: &Payload) -> Option<Self> {
        let flagged = match payload.get("error")? {
            Value::Bool(b) => *b,
            Value::String(s) => s.eq_ignore_ascii_case("true"),
            _ => false,
        };
        if !flagged {
            return None;
        }

        let message = payload
            .get("message")
            .and_then(Value::to_display_string)
            .unwrap_or_default();
        Some(Self::rejected(message))
    }
}

impl fmt::Display for DriverFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

impl std::error::Error for DriverFailure {}

impl From<RuntimeError> for DriverFailure {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::MissingConfig { .. } | RuntimeError::InvalidConfig { .. } => {
                DriverFailure::configuration(err.to_string())
            }
            RuntimeError::HttpClient(message) => DriverFailure::transport(message),
            other => DriverFailure::rejected(other.to_string()),
        }
    }
}

/// A provider integration
#[async_trait]
pub trait ServiceDriver: Send + Sync {
    /// Key providers use to reference this driver
    fn driver_key(&self) -> &str;

    /// Service type this driver serves; `Generic` serves any type
    fn service_type(&self) -> ServiceType;

    fn supports(&self, service_type: ServiceType) -> bool {
        let own = self.service_type();
        own == service_type || own == ServiceType::Generic
    }

    /// Execute one call. `config` is the provider's stored config merged with
    /// its environment secrets.
    async fn execute(&self, request: &Payload, config: &Payload) -> DriverOutcome;
}
