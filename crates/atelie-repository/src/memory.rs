//! In-memory catalog
//!
//! Holds providers, rules, provider configs and settings behind one lock so a
//! wholesale replacement is observed atomically by readers.

use async_trait::async_trait;
use atelie_core::{ServiceProvider, ServiceRoutingRule, ServiceType};
use tokio::sync::RwLock;

use crate::error::{RepositoryError, RepositoryResult};
use crate::models::{CatalogDocument, ProviderConfigRecord, SystemConfigEntry};
use crate::traits::{ProviderConfigGateway, ProviderGateway, RoutingRuleGateway, SystemConfigGateway};

#[derive(Debug, Clone, Default)]
struct CatalogState {
    providers: Vec<ServiceProvider>,
    rules: Vec<ServiceRoutingRule>,
    configs: Vec<ProviderConfigRecord>,
    settings: Vec<SystemConfigEntry>,
}

impl CatalogState {
    fn from_document(doc: CatalogDocument) -> Self {
        let settings = doc.setting_entries();
        Self {
            providers: doc.providers,
            rules: doc.rules.into_iter().map(|r| r.into_rule()).collect(),
            configs: doc.provider_configs.into_iter().map(|c| c.into_record()).collect(),
            settings,
        }
    }
}

/// Catalog kept entirely in memory
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    state: RwLock<CatalogState>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a validated catalog document
    pub fn from_document(doc: CatalogDocument) -> RepositoryResult<Self> {
        doc.validate()?;
        Ok(Self {
            state: RwLock::new(CatalogState::from_document(doc)),
        })
    }

    pub fn with_provider(mut self, provider: ServiceProvider) -> Self {
        self.state.get_mut().providers.push(provider);
        self
    }

    pub fn with_rule(mut self, rule: ServiceRoutingRule) -> Self {
        self.state.get_mut().rules.push(rule);
        self
    }

    pub fn with_config(mut self, record: ProviderConfigRecord) -> Self {
        self.state.get_mut().configs.push(record);
        self
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.state
            .get_mut()
            .settings
            .push(SystemConfigEntry::new(key, value));
        self
    }

    /// Swap the whole catalog for the content of `doc`
    pub async fn replace_with(&self, doc: CatalogDocument) -> RepositoryResult<()> {
        doc.validate()?;
        let next = CatalogState::from_document(doc);
        *self.state.write().await = next;
        Ok(())
    }

    /// Insert or replace a provider identified by type and code
    pub async fn upsert_provider(&self, provider: ServiceProvider) {
        let mut state = self.state.write().await;
        match state
            .providers
            .iter_mut()
            .find(|p| p.service_type == provider.service_type && p.code == provider.code)
        {
            Some(existing) => *existing = provider,
            None => state.providers.push(provider),
        }
    }

    pub async fn set_provider_enabled(
        &self,
        service_type: ServiceType,
        code: &str,
        enabled: bool,
    ) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        let provider = state
            .providers
            .iter_mut()
            .find(|p| p.service_type == service_type && p.code == code)
            .ok_or_else(|| RepositoryError::ProviderNotFound {
                code: code.to_string(),
            })?;
        provider.enabled = enabled;
        Ok(())
    }

    /// Insert or replace a rule identified by id
    pub async fn upsert_rule(&self, rule: ServiceRoutingRule) {
        let mut state = self.state.write().await;
        match state.rules.iter_mut().find(|r| r.id == rule.id) {
            Some(existing) => *existing = rule,
            None => state.rules.push(rule),
        }
    }

    /// Store a new config version; older versions stay but are shadowed
    pub async fn put_config(&self, record: ProviderConfigRecord) {
        self.state.write().await.configs.push(record);
    }

    pub async fn put_setting(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        let mut state = self.state.write().await;
        match state.settings.iter_mut().find(|e| e.key == key) {
            Some(existing) => existing.value = value,
            None => state.settings.push(SystemConfigEntry::new(key, value)),
        }
    }
}

#[async_trait]
impl ProviderGateway for InMemoryCatalog {
    async fn find_enabled_by_type_ordered(
        &self,
        service_type: ServiceType,
    ) -> RepositoryResult<Vec<ServiceProvider>> {
        let state = self.state.read().await;
        let mut providers: Vec<_> = state
            .providers
            .iter()
            .filter(|p| p.service_type == service_type && p.enabled)
            .cloned()
            .collect();
        providers.sort_by(ServiceProvider::routing_order);
        Ok(providers)
    }

    async fn find_by_code(
        &self,
        service_type: ServiceType,
        code: &str,
    ) -> RepositoryResult<Option<ServiceProvider>> {
        let state = self.state.read().await;
        Ok(state
            .providers
            .iter()
            .find(|p| p.service_type == service_type && p.code == code)
            .cloned())
    }
}

#[async_trait]
impl RoutingRuleGateway for InMemoryCatalog {
    async fn find_enabled_by_type_ordered(
        &self,
        service_type: ServiceType,
    ) -> RepositoryResult<Vec<ServiceRoutingRule>> {
        let state = self.state.read().await;
        let mut rules: Vec<_> = state
            .rules
            .iter()
            .filter(|r| r.service_type == service_type && r.enabled)
            .cloned()
            .collect();
        rules.sort_by(ServiceRoutingRule::evaluation_order);
        Ok(rules)
    }
}

#[async_trait]
impl ProviderConfigGateway for InMemoryCatalog {
    async fn find_config_json(
        &self,
        provider_code: &str,
        environment: &str,
    ) -> RepositoryResult<Option<String>> {
        let state = self.state.read().await;
        Ok(state
            .configs
            .iter()
            .filter(|c| c.provider_code == provider_code && c.environment == environment)
            .max_by_key(|c| c.version)
            .map(|c| c.config_json.clone()))
    }

    async fn refresh(&self) -> RepositoryResult<()> {
        Ok(())
    }
}

#[async_trait]
impl SystemConfigGateway for InMemoryCatalog {
    async fn load_all(&self) -> RepositoryResult<Vec<SystemConfigEntry>> {
        Ok(self.state.read().await.settings.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipping(code: &str, priority: i32) -> ServiceProvider {
        ServiceProvider::new(ServiceType::Shipping, code, "shipping.zone").with_priority(priority)
    }

    #[tokio::test]
    async fn test_providers_filtered_and_ordered() {
        let catalog = InMemoryCatalog::new()
            .with_provider(shipping("B", 2))
            .with_provider(shipping("A", 2))
            .with_provider(shipping("OFF", 0).with_enabled(false))
            .with_provider(shipping("FIRST", 1))
            .with_provider(ServiceProvider::new(ServiceType::Payment, "MP", "payment.webhook"));

        let providers = ProviderGateway::find_enabled_by_type_ordered(&catalog, ServiceType::Shipping)
            .await
            .unwrap();
        let codes: Vec<_> = providers.iter().map(|p| p.code.as_str()).collect();

        assert_eq!(codes, vec!["FIRST", "A", "B"]);
    }

    #[tokio::test]
    async fn test_rules_for_provider() {
        let catalog = InMemoryCatalog::new()
            .with_rule(ServiceRoutingRule::new(ServiceType::Shipping, "J3", "{}").with_priority(2))
            .with_rule(ServiceRoutingRule::new(ServiceType::Shipping, "J3", r#"{"country":"BR"}"#).with_priority(1))
            .with_rule(ServiceRoutingRule::new(ServiceType::Shipping, "OTHER", "{}"))
            .with_rule(
                ServiceRoutingRule::new(ServiceType::Shipping, "J3", "{}")
                    .with_priority(0)
                    .with_enabled(false),
            );

        let rules = catalog
            .find_enabled_for_provider(ServiceType::Shipping, "J3")
            .await
            .unwrap();

        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].match_json, r#"{"country":"BR"}"#);
    }

    #[tokio::test]
    async fn test_highest_config_version_wins() {
        let catalog = InMemoryCatalog::new()
            .with_config(ProviderConfigRecord::new("J3", "prod", r#"{"rate":10}"#).with_version(1))
            .with_config(ProviderConfigRecord::new("J3", "prod", r#"{"rate":12}"#).with_version(3))
            .with_config(ProviderConfigRecord::new("J3", "sandbox", r#"{"rate":1}"#).with_version(9));

        let json = catalog.find_config_json("J3", "prod").await.unwrap();
        assert_eq!(json.as_deref(), Some(r#"{"rate":12}"#));
        assert!(catalog.find_config_json("J3", "dev").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_toggle_provider() {
        let catalog = InMemoryCatalog::new().with_provider(shipping("J3", 1));

        catalog
            .set_provider_enabled(ServiceType::Shipping, "J3", false)
            .await
            .unwrap();
        let providers = ProviderGateway::find_enabled_by_type_ordered(&catalog, ServiceType::Shipping)
            .await
            .unwrap();
        assert!(providers.is_empty());

        let err = catalog
            .set_provider_enabled(ServiceType::Shipping, "NOPE", true)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ProviderNotFound { .. }));
    }

    #[tokio::test]
    async fn test_put_setting_overwrites() {
        let catalog = InMemoryCatalog::new().with_setting("FLAT_RATE", "10");
        catalog.put_setting("FLAT_RATE", "12.5").await;

        let entries = catalog.load_all().await.unwrap();
        assert_eq!(entries, vec![SystemConfigEntry::new("FLAT_RATE", "12.5")]);
    }
}
