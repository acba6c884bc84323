//! Shipping quotes with a contingency hop
//!
//! Quoting never fails for ordinary provider trouble. When every routed
//! provider is exhausted, the contingency provider (flat rate by default) is
//! executed once with config layered from, lowest first:
//!
//! 1. `EngineConfig.contingency` (`rate`, `free_threshold`)
//! 2. the `FLAT_RATE` and `FLAT_FREE_SHIPPING_THRESHOLD` settings
//! 3. the contingency provider's stored config and secrets
//!
//! Only a failing contingency hop surfaces as [`SdkError::ContingencyFailed`].

use crate::config::ContingencyConfig;
use crate::error::{Result, SdkError};
use crate::orchestrator::{ServiceOrchestrator, FORCED_PROVIDER_KEY};
use atelie_core::model::PROVIDER_MARKER;
use atelie_core::{MatchedRule, Payload, ProviderAttempt, ServiceResult, ServiceType, Value};
use atelie_runtime::{DriverFailure, DynamicConfigService};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::timeout;

/// Setting holding the contingency rate
pub const FLAT_RATE_KEY: &str = "FLAT_RATE";
/// Setting holding the contingency free-shipping threshold
pub const FLAT_FREE_SHIPPING_THRESHOLD_KEY: &str = "FLAT_FREE_SHIPPING_THRESHOLD";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingQuoteRequest {
    pub cep: String,
    pub subtotal: f64,
    #[serde(default)]
    pub country: Option<String>,
    /// Provider code that bypasses routing rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forced_provider: Option<String>,
    /// Extra request fields, visible to rules as `attributes`
    #[serde(default)]
    pub attributes: Payload,
}

impl ShippingQuoteRequest {
    pub fn new(cep: impl Into<String>, subtotal: f64) -> Self {
        Self {
            cep: cep.into(),
            subtotal,
            country: None,
            forced_provider: None,
            attributes: Payload::new(),
        }
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_forced_provider(mut self, provider_code: impl Into<String>) -> Self {
        self.forced_provider = Some(provider_code.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Request map handed to the orchestrator. Typed fields win over
    /// attributes of the same name.
    pub fn to_payload(&self) -> Payload {
        let mut payload = self.attributes.clone();
        payload.insert("cep".to_string(), Value::String(self.cep.clone()));
        payload.insert("subtotal".to_string(), Value::Number(self.subtotal));
        if let Some(country) = &self.country {
            payload.insert("country".to_string(), Value::String(country.clone()));
        }
        if let Some(code) = &self.forced_provider {
            payload.insert(FORCED_PROVIDER_KEY.to_string(), Value::String(code.clone()));
        }
        payload
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingQuote {
    /// Catalog code of the provider that produced the quote
    pub provider_code: String,
    /// Display label reported by the driver
    pub provider: String,
    pub eligible: bool,
    pub free_shipping: bool,
    pub cost: f64,
    pub threshold: Option<f64>,
    /// Quote came from the contingency hop
    pub contingency: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_rule: Option<MatchedRule>,
    #[serde(default)]
    pub attempts: Vec<ProviderAttempt>,
}

impl ShippingQuote {
    /// Read a quote out of a driver payload; `None` without a numeric `cost`
    fn from_payload(provider_code: &str, payload: &Payload, contingency: bool) -> Option<Self> {
        let cost = payload.get("cost").and_then(Value::to_number_lenient)?;
        let provider = payload
            .get(PROVIDER_MARKER)
            .and_then(Value::to_display_string)
            .unwrap_or_else(|| provider_code.to_string());

        Some(Self {
            provider_code: provider_code.to_string(),
            provider,
            eligible: payload.get("eligible").and_then(Value::as_bool).unwrap_or(true),
            free_shipping: payload
                .get("free_shipping")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            cost,
            threshold: payload.get("threshold").and_then(Value::to_number_lenient),
            contingency,
            matched_rule: None,
            attempts: Vec::new(),
        })
    }
}

pub struct ShippingQuoteService {
    orchestrator: Arc<ServiceOrchestrator>,
    settings: Option<Arc<DynamicConfigService>>,
    contingency: ContingencyConfig,
}

impl ShippingQuoteService {
    pub fn new(orchestrator: Arc<ServiceOrchestrator>) -> Self {
        Self {
            orchestrator,
            settings: None,
            contingency: ContingencyConfig::default(),
        }
    }

    pub fn with_settings(mut self, settings: Arc<DynamicConfigService>) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn with_contingency(mut self, contingency: ContingencyConfig) -> Self {
        self.contingency = contingency;
        self
    }

    pub async fn quote(&self, request: &ShippingQuoteRequest, environment: &str) -> Result<ShippingQuote> {
        let payload = request.to_payload();
        let result = self
            .orchestrator
            .resolve_and_execute(ServiceType::Shipping, &payload, environment)
            .await?;

        if result.success {
            let provider_code = result.provider_code.clone().unwrap_or_default();
            match ShippingQuote::from_payload(&provider_code, &result.payload, false) {
                Some(mut quote) => {
                    quote.matched_rule = result.matched_rule;
                    quote.attempts = result.attempts;
                    return Ok(quote);
                }
                None => tracing::warn!(
                    "Provider {} answered without a usable cost, using contingency",
                    provider_code
                ),
            }
        } else {
            tracing::warn!(
                "Shipping routing exhausted ({}), using contingency provider {}",
                result.message.as_deref().unwrap_or(result.error_code().unwrap_or_default()),
                self.contingency.provider_code
            );
        }

        self.contingency_quote(&payload, environment, result).await
    }

    async fn contingency_quote(
        &self,
        request: &Payload,
        environment: &str,
        routed: ServiceResult,
    ) -> Result<ShippingQuote> {
        self.orchestrator.metrics().contingency_hops.inc();
        let provider_code = self.contingency.provider_code.clone();
        let failed = |message: String| SdkError::ContingencyFailed {
            provider_code: provider_code.clone(),
            message,
        };

        let driver = self
            .orchestrator
            .registry()
            .find_by_driver_key(&self.contingency.driver_key)
            .ok_or_else(|| failed(format!("unknown driver '{}'", self.contingency.driver_key)))?;

        let config = self.contingency_config(environment).await.map_err(|e| failed(e.to_string()))?;

        let payload = match timeout(self.orchestrator.driver_timeout(), driver.execute(request, &config)).await {
            Ok(Ok(payload)) => match DriverFailure::from_payload(&payload) {
                None => payload,
                Some(failure) => return Err(failed(failure.to_string())),
            },
            Ok(Err(failure)) => return Err(failed(failure.to_string())),
            Err(_) => return Err(failed("timed out".to_string())),
        };

        let mut quote = ShippingQuote::from_payload(&provider_code, &payload, true)
            .ok_or_else(|| failed("quote without cost".to_string()))?;
        quote.attempts = routed.attempts;
        tracing::info!("Shipping quoted by contingency provider {}: {}", provider_code, quote.cost);
        Ok(quote)
    }

    async fn contingency_config(&self, environment: &str) -> Result<Payload> {
        let mut config = Payload::new();
        if let Some(rate) = self.contingency.rate {
            config.insert("rate".to_string(), Value::Number(rate));
        }
        if let Some(threshold) = self.contingency.free_threshold {
            config.insert("free_threshold".to_string(), Value::Number(threshold));
        }

        if let Some(settings) = &self.settings {
            let snapshot = settings.snapshot();
            if snapshot.get_string(FLAT_RATE_KEY).is_some() {
                config.insert("rate".to_string(), Value::Number(snapshot.require_decimal(FLAT_RATE_KEY)?));
            }
            if snapshot.get_string(FLAT_FREE_SHIPPING_THRESHOLD_KEY).is_some() {
                let threshold = snapshot.require_decimal(FLAT_FREE_SHIPPING_THRESHOLD_KEY)?;
                config.insert("free_threshold".to_string(), Value::Number(threshold));
            }
        }

        let stored = self
            .orchestrator
            .provider_config(&self.contingency.provider_code, environment)
            .await?;
        config.extend(stored);
        Ok(config)
    }
}

impl std::fmt::Debug for ShippingQuoteService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShippingQuoteService")
            .field("contingency", &self.contingency)
            .finish()
    }
}
