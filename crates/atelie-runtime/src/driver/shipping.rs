//! Computed shipping drivers
//!
//! Both drivers price a quote from provider config alone, without any
//! network call. Output keys: `provider`, `cost`, `eligible`,
//! `free_shipping`, `threshold`.

use super::config_reader::ConfigReader;
use super::{DriverFailure, DriverOutcome, ServiceDriver};
use async_trait::async_trait;
use atelie_core::model::{digits_only, PROVIDER_MARKER};
use atelie_core::{Payload, ServiceType, Value};

pub const ZONE_SHIPPING_KEY: &str = "shipping.zone";
pub const J3_SHIPPING_KEY: &str = "shipping.j3";
pub const FLAT_RATE_SHIPPING_KEY: &str = "shipping.flat_rate";
pub const FLAT_RATE_PROVIDER: &str = "FLAT_RATE";

const SUBTOTAL_KEYS: &[&str] = &["subtotal", "orderTotal", "order_total", "total"];

/// CEP digits and subtotal of a quote request
struct QuoteInput {
    cep: String,
    subtotal: f64,
}

impl QuoteInput {
    fn from_request(request: &Payload) -> Result<Self, DriverFailure> {
        let cep = request
            .get("cep")
            .and_then(Value::to_display_string)
            .map(|c| digits_only(&c))
            .filter(|c| !c.is_empty())
            .ok_or_else(|| DriverFailure::invalid_request("request is missing 'cep'"))?;

        let subtotal = SUBTOTAL_KEYS
            .iter()
            .find_map(|key| request.get(*key).and_then(Value::to_number_lenient))
            .ok_or_else(|| DriverFailure::invalid_request("request is missing 'subtotal'"))?;

        Ok(Self { cep, subtotal })
    }
}

struct Pricing {
    rate: f64,
    free_threshold: Option<f64>,
}

impl Pricing {
    fn from_config(reader: &ConfigReader<'_>) -> Result<Self, DriverFailure> {
        let rate = reader.require_number("rate")?;
        if rate < 0.0 {
            return Err(DriverFailure::configuration(format!("rate must not be negative, got {}", rate)));
        }
        Ok(Self {
            rate,
            free_threshold: reader.optional_number("free_threshold")?,
        })
    }

    fn is_free(&self, subtotal: f64) -> bool {
        self.free_threshold.is_some_and(|threshold| subtotal >= threshold)
    }
}

fn quote_payload(provider: String, eligible: bool, free: bool, cost: f64, threshold: Option<f64>) -> Payload {
    let mut payload = Payload::new();
    payload.insert(PROVIDER_MARKER.to_string(), Value::String(provider));
    payload.insert("cost".to_string(), Value::Number(cost));
    payload.insert("eligible".to_string(), Value::Bool(eligible));
    payload.insert("free_shipping".to_string(), Value::Bool(free));
    payload.insert(
        "threshold".to_string(),
        threshold.map(Value::Number).unwrap_or(Value::Null),
    );
    payload
}

/// Zone shipping: flat rate inside a set of CEP prefixes, free above a
/// subtotal threshold
///
/// Config: `rate` (required), `free_threshold`, `cep_prefixes` (list or
/// comma separated; empty serves every CEP), `provider_label`,
/// `reject_ineligible`.
#[derive(Debug, Clone)]
pub struct ZoneShippingDriver {
    key: String,
}

impl ZoneShippingDriver {
    pub fn new() -> Self {
        Self::with_key(ZONE_SHIPPING_KEY)
    }

    pub fn with_key(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Default for ZoneShippingDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServiceDriver for ZoneShippingDriver {
    fn driver_key(&self) -> &str {
        &self.key
    }

    fn service_type(&self) -> ServiceType {
        ServiceType::Shipping
    }

    async fn execute(&self, request: &Payload, config: &Payload) -> DriverOutcome {
        let reader = ConfigReader::new(config);
        let pricing = Pricing::from_config(&reader)?;
        let input = QuoteInput::from_request(request)?;

        let prefixes = reader.prefix_list("cep_prefixes");
        let eligible = prefixes.is_empty() || prefixes.iter().any(|p| input.cep.starts_with(p.as_str()));
        if !eligible && reader.flag("reject_ineligible") {
            return Err(DriverFailure::rejected(format!("CEP {} is outside the served zone", input.cep)));
        }

        let free = pricing.is_free(input.subtotal);
        let cost = if eligible && free { 0.0 } else { pricing.rate };
        let provider = reader
            .optional_str("provider_label")
            .or_else(|| reader.optional_str("provider_code"))
            .unwrap_or_else(|| self.key.clone());

        Ok(quote_payload(provider, eligible, free, cost, pricing.free_threshold))
    }
}

/// Flat rate for every CEP; the offline contingency strategy
///
/// Config: `rate` (required), `free_threshold`, `provider_label`.
#[derive(Debug, Clone, Default)]
pub struct FlatRateShippingDriver;

impl FlatRateShippingDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ServiceDriver for FlatRateShippingDriver {
    fn driver_key(&self) -> &str {
        FLAT_RATE_SHIPPING_KEY
    }

    fn service_type(&self) -> ServiceType {
        ServiceType::Shipping
    }

    async fn execute(&self, request: &Payload, config: &Payload) -> DriverOutcome {
        let reader = ConfigReader::new(config);
        let pricing = Pricing::from_config(&reader)?;
        let subtotal = SUBTOTAL_KEYS
            .iter()
            .find_map(|key| request.get(*key).and_then(Value::to_number_lenient))
            .unwrap_or(0.0);

        let free = pricing.is_free(subtotal);
        let cost = if free { 0.0 } else { pricing.rate };
        let provider = reader
            .optional_str("provider_label")
            .unwrap_or_else(|| FLAT_RATE_PROVIDER.to_string());

        Ok(quote_payload(provider, true, free, cost, pricing.free_threshold))
    }
}
