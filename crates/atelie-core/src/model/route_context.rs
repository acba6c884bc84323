//! Facts a routing rule is evaluated against

use crate::types::{Payload, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Country assumed when the request does not carry one
pub const DEFAULT_COUNTRY: &str = "BR";

const CEP_KEYS: &[&str] = &["cep", "zip", "postal_code"];
const TOTAL_KEYS: &[&str] = &["orderTotal", "order_total", "amount", "subtotal", "total"];

/// Per-request routing facts. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteContext {
    pub country: String,
    /// CEP or ZIP as received, formatting included
    pub cep: String,
    pub order_total: f64,
    pub attributes: HashMap<String, Value>,
}

impl RouteContext {
    pub fn new(country: impl Into<String>, cep: impl Into<String>, order_total: f64) -> Self {
        Self {
            country: country.into(),
            cep: cep.into(),
            order_total,
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_attributes(mut self, attributes: HashMap<String, Value>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Build the context from a raw request payload.
    ///
    /// The whole request becomes `attributes`, so rules can reach any field the
    /// caller sent. Well-known keys feed the typed fields.
    pub fn from_request(request: &Payload) -> Self {
        let country = request
            .get("country")
            .and_then(Value::to_display_string)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string());

        let cep = CEP_KEYS
            .iter()
            .find_map(|k| request.get(*k).and_then(Value::to_display_string))
            .unwrap_or_default();

        let order_total = TOTAL_KEYS
            .iter()
            .find_map(|k| request.get(*k).and_then(Value::to_number_lenient))
            .unwrap_or(0.0);

        Self {
            country,
            cep,
            order_total,
            attributes: request.clone(),
        }
    }

    /// CEP with every non-digit character removed
    pub fn cep_digits(&self) -> String {
        digits_only(&self.cep)
    }

    /// Resolve a root variable by the name rules use for it
    pub fn variable(&self, name: &str) -> Option<Value> {
        match name {
            "country" => Some(Value::String(self.country.clone())),
            "cep" => Some(Value::String(self.cep.clone())),
            "cepDigits" => Some(Value::String(self.cep_digits())),
            "orderTotal" => Some(Value::Number(self.order_total)),
            "attributes" => Some(Value::Object(self.attributes.clone())),
            _ => None,
        }
    }
}

/// Strip every character that is not an ASCII digit
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::payload_from_json;
    use serde_json::json;

    #[test]
    fn test_from_request_defaults() {
        let request = payload_from_json(json!({})).unwrap();
        let ctx = RouteContext::from_request(&request);

        assert_eq!(ctx.country, "BR");
        assert_eq!(ctx.cep, "");
        assert_eq!(ctx.order_total, 0.0);
    }

    #[test]
    fn test_from_request_reads_known_keys() {
        let request = payload_from_json(json!({
            "country": "US",
            "zip": "94105",
            "subtotal": "89.90",
            "channel": "app"
        }))
        .unwrap();
        let ctx = RouteContext::from_request(&request);

        assert_eq!(ctx.country, "US");
        assert_eq!(ctx.cep, "94105");
        assert_eq!(ctx.order_total, 89.9);
        assert_eq!(ctx.attributes.get("channel"), Some(&Value::from("app")));
    }

    #[test]
    fn test_order_total_from_payment_amount() {
        let request = payload_from_json(json!({"order_id": "A-1", "amount": 249.9})).unwrap();
        assert_eq!(RouteContext::from_request(&request).order_total, 249.9);

        let request = payload_from_json(json!({"amount": "80", "subtotal": 70, "total": 90})).unwrap();
        assert_eq!(RouteContext::from_request(&request).order_total, 80.0);
    }

    #[test]
    fn test_order_total_prefers_explicit_key() {
        let request = payload_from_json(json!({"orderTotal": 300, "subtotal": 10})).unwrap();
        assert_eq!(RouteContext::from_request(&request).order_total, 300.0);
    }

    #[test]
    fn test_cep_digits() {
        let ctx = RouteContext::new("BR", "01001-000", 0.0);
        assert_eq!(ctx.cep_digits(), "01001000");
        assert_eq!(digits_only(" 99.999-000 "), "99999000");
    }

    #[test]
    fn test_variable_lookup() {
        let ctx = RouteContext::new("BR", "01001-000", 150.0).with_attribute("vip", true);

        assert_eq!(ctx.variable("orderTotal"), Some(Value::Number(150.0)));
        assert_eq!(ctx.variable("cepDigits"), Some(Value::from("01001000")));
        assert!(matches!(ctx.variable("attributes"), Some(Value::Object(_))));
        assert_eq!(ctx.variable("unknown"), None);
    }
}
