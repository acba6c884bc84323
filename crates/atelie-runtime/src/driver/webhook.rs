//! Generic webhook driver
//!
//! POSTs the request payload as JSON to the provider's `url` and normalizes
//! the JSON object it answers with.
//!
//! Config keys:
//! - `url` (required): `http` or `https` endpoint
//! - `auth_token`: sent as `Authorization: Bearer <token>`
//! - `headers`: object of extra string headers
//! - `provider_code`: used as the `provider` marker when the answer has none

use super::config_reader::ConfigReader;
use super::http::HttpClient;
use super::{DriverFailure, DriverOutcome, ServiceDriver};
use async_trait::async_trait;
use atelie_core::model::PROVIDER_MARKER;
use atelie_core::types::{payload_from_json, payload_to_json};
use atelie_core::{Payload, ServiceType, Value};
use std::sync::Arc;

pub const GENERIC_WEBHOOK_KEY: &str = "generic.webhook";
pub const NOTIFICATION_WEBHOOK_KEY: &str = "notification.webhook";

const BODY_SNIPPET_LEN: usize = 200;

pub struct GenericWebhookDriver {
    key: String,
    service_type: ServiceType,
    http: Arc<dyn HttpClient>,
}

impl GenericWebhookDriver {
    /// The `generic.webhook` driver, usable for any service type
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self::for_service(GENERIC_WEBHOOK_KEY, ServiceType::Generic, http)
    }

    /// Same behavior registered under another key for one service type
    pub fn for_service(key: impl Into<String>, service_type: ServiceType, http: Arc<dyn HttpClient>) -> Self {
        Self {
            key: key.into(),
            service_type,
            http,
        }
    }

    fn endpoint(reader: &ConfigReader<'_>) -> Result<String, DriverFailure> {
        let url = reader.require_str("url")?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(DriverFailure::configuration(format!(
                "webhook url must be http(s), got '{}'",
                url
            )));
        }
        Ok(url)
    }

    fn headers(reader: &ConfigReader<'_>) -> Vec<(String, String)> {
        let mut headers = Vec::new();
        if let Some(token) = reader.optional_str("auth_token") {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }
        if let Some(extra) = reader.object("headers") {
            for (name, value) in extra {
                match value.to_display_string() {
                    Some(value) => headers.push((name.clone(), value)),
                    None => tracing::debug!("Skipping non-scalar header '{}'", name),
                }
            }
        }
        headers
    }

    /// `price` or `cost` becomes a numeric `cost`, `status` becomes text
    fn normalize(mut payload: Payload, reader: &ConfigReader<'_>) -> Payload {
        let cost = payload
            .get("cost")
            .or_else(|| payload.get("price"))
            .and_then(Value::to_number_lenient);
        if let Some(cost) = cost {
            payload.remove("price");
            payload.insert("cost".to_string(), Value::Number(cost));
        }

        if let Some(status) = payload.get("status").and_then(Value::to_display_string) {
            payload.insert("status".to_string(), Value::String(status));
        }

        if !payload.contains_key(PROVIDER_MARKER) {
            if let Some(code) = reader.optional_str("provider_code") {
                payload.insert(PROVIDER_MARKER.to_string(), Value::String(code));
            }
        }

        payload
    }
}

#[async_trait]
impl ServiceDriver for GenericWebhookDriver {
    fn driver_key(&self) -> &str {
        &self.key
    }

    fn service_type(&self) -> ServiceType {
        self.service_type
    }

    async fn execute(&self, request: &Payload, config: &Payload) -> DriverOutcome {
        let reader = ConfigReader::new(config);
        let url = Self::endpoint(&reader)?;
        let headers = Self::headers(&reader);

        let response = self
            .http
            .post_json(&url, &headers, &payload_to_json(request))
            .await?;

        if !response.is_success() {
            let snippet: String = response.body.chars().take(BODY_SNIPPET_LEN).collect();
            return Err(DriverFailure::rejected(format!(
                "webhook returned HTTP {}: {}",
                response.status, snippet
            )));
        }

        let payload = if response.body.trim().is_empty() {
            Payload::new()
        } else {
            let json: serde_json::Value = serde_json::from_str(&response.body)
                .map_err(|e| DriverFailure::invalid_response(format!("response is not JSON: {}", e)))?;
            payload_from_json(json)
                .ok_or_else(|| DriverFailure::invalid_response("response is not a JSON object"))?
        };

        if let Some(failure) = DriverFailure::from_payload(&payload) {
            return Err(failure);
        }

        Ok(Self::normalize(payload, &reader))
    }
}
