//! Provider and routing rule records

use super::service_type::ServiceType;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

fn default_enabled() -> bool {
    true
}

fn default_priority() -> i32 {
    100
}

/// A configured business entity (carrier, gateway, webhook target) behind a driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceProvider {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub service_type: ServiceType,
    /// Stable business identifier, e.g. `J3`
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Lower value is tried first
    #[serde(default = "default_priority")]
    pub priority: i32,
    pub driver_key: String,
    #[serde(default)]
    pub health_enabled: bool,
}

impl ServiceProvider {
    pub fn new(
        service_type: ServiceType,
        code: impl Into<String>,
        driver_key: impl Into<String>,
    ) -> Self {
        let code = code.into();
        Self {
            id: Uuid::new_v4(),
            service_type,
            name: code.clone(),
            code,
            enabled: true,
            priority: default_priority(),
            driver_key: driver_key.into(),
            health_enabled: false,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Total routing order: priority ascending, ties broken by code
    pub fn routing_order(a: &ServiceProvider, b: &ServiceProvider) -> Ordering {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.code.cmp(&b.code))
    }
}

/// Stored eligibility predicate for one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRoutingRule {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub service_type: ServiceType,
    pub provider_code: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_priority")]
    pub priority: i32,
    /// Serialized predicate, expression or legacy dialect
    pub match_json: String,
    /// Opaque extension data carried through to results untouched
    #[serde(default)]
    pub behavior_json: Option<String>,
}

impl ServiceRoutingRule {
    pub fn new(
        service_type: ServiceType,
        provider_code: impl Into<String>,
        match_json: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            service_type,
            provider_code: provider_code.into(),
            enabled: true,
            priority: default_priority(),
            match_json: match_json.into(),
            behavior_json: None,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_behavior(mut self, behavior_json: impl Into<String>) -> Self {
        self.behavior_json = Some(behavior_json.into());
        self
    }

    /// Evaluation order: priority ascending, ties broken by id
    pub fn evaluation_order(a: &ServiceRoutingRule, b: &ServiceRoutingRule) -> Ordering {
        a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_order_breaks_ties_by_code() {
        let mut providers = vec![
            ServiceProvider::new(ServiceType::Shipping, "ZETA", "shipping.zone").with_priority(1),
            ServiceProvider::new(ServiceType::Shipping, "ALPHA", "shipping.zone").with_priority(1),
            ServiceProvider::new(ServiceType::Shipping, "FIRST", "shipping.zone").with_priority(0),
        ];
        providers.sort_by(ServiceProvider::routing_order);

        let codes: Vec<_> = providers.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["FIRST", "ALPHA", "ZETA"]);
    }

    #[test]
    fn test_provider_deserialize_defaults() {
        let provider: ServiceProvider = serde_json::from_str(
            r#"{"service_type":"SHIPPING","code":"J3","driver_key":"shipping.j3"}"#,
        )
        .unwrap();

        assert!(provider.enabled);
        assert_eq!(provider.priority, 100);
        assert!(!provider.health_enabled);
    }

    #[test]
    fn test_rule_builder() {
        let rule = ServiceRoutingRule::new(ServiceType::Payment, "MP", r#"{"country":"BR"}"#)
            .with_priority(5)
            .with_behavior(r#"{"installments":3}"#);

        assert_eq!(rule.priority, 5);
        assert_eq!(rule.behavior_json.as_deref(), Some(r#"{"installments":3}"#));
        assert!(rule.enabled);
    }
}
