//! Builder pattern for RoutingEngine

use crate::config::EngineConfig;
use crate::engine::RoutingEngine;
use crate::error::{Result, SdkError};
use crate::orchestrator::ServiceOrchestrator;
use crate::payment::PaymentService;
use crate::shipping::ShippingQuoteService;
use atelie_repository::{ProviderConfigGateway, ProviderGateway, RoutingRuleGateway, SystemConfigGateway};
use atelie_runtime::{
    DriverRegistry, DynamicConfigService, EnvSecretSource, HttpClient, ReqwestHttpClient, RoutingMetrics,
    SecretSource, ServiceDriver,
};
use std::sync::Arc;

/// Builder for RoutingEngine
///
/// # Example
///
/// ```rust,ignore
/// use atelie_repository::FileSystemCatalog;
/// use atelie_sdk::{EngineConfig, RoutingEngineBuilder};
/// use std::sync::Arc;
///
/// let catalog = Arc::new(FileSystemCatalog::open("config/catalog.yaml").await?);
/// let engine = RoutingEngineBuilder::new()
///     .with_config(EngineConfig::load()?)
///     .with_catalog(catalog)
///     .build()
///     .await?;
/// ```
pub struct RoutingEngineBuilder {
    config: EngineConfig,
    providers: Option<Arc<dyn ProviderGateway>>,
    rules: Option<Arc<dyn RoutingRuleGateway>>,
    configs: Option<Arc<dyn ProviderConfigGateway>>,
    settings: Option<Arc<dyn SystemConfigGateway>>,
    secrets: Option<Arc<dyn SecretSource>>,
    http: Option<Arc<dyn HttpClient>>,
    drivers: Vec<Arc<dyn ServiceDriver>>,
}

impl RoutingEngineBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: EngineConfig::new(),
            providers: None,
            rules: None,
            configs: None,
            settings: None,
            secrets: None,
            http: None,
            drivers: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Use one catalog for every gateway
    pub fn with_catalog<C>(self, catalog: Arc<C>) -> Self
    where
        C: ProviderGateway + RoutingRuleGateway + ProviderConfigGateway + SystemConfigGateway + 'static,
    {
        self.with_provider_gateway(catalog.clone())
            .with_rule_gateway(catalog.clone())
            .with_config_gateway(catalog.clone())
            .with_settings_gateway(catalog)
    }

    pub fn with_provider_gateway(mut self, gateway: Arc<dyn ProviderGateway>) -> Self {
        self.providers = Some(gateway);
        self
    }

    pub fn with_rule_gateway(mut self, gateway: Arc<dyn RoutingRuleGateway>) -> Self {
        self.rules = Some(gateway);
        self
    }

    pub fn with_config_gateway(mut self, gateway: Arc<dyn ProviderConfigGateway>) -> Self {
        self.configs = Some(gateway);
        self
    }

    pub fn with_settings_gateway(mut self, gateway: Arc<dyn SystemConfigGateway>) -> Self {
        self.settings = Some(gateway);
        self
    }

    /// Replace the environment-variable secret source
    pub fn with_secret_source(mut self, secrets: Arc<dyn SecretSource>) -> Self {
        self.secrets = Some(secrets);
        self
    }

    /// HTTP client used by the built-in webhook drivers
    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Register an extra driver; a built-in driver with the same key is replaced
    pub fn with_driver(mut self, driver: Arc<dyn ServiceDriver>) -> Self {
        self.drivers.push(driver);
        self
    }

    /// Build the routing engine and load the first settings snapshot
    pub async fn build(self) -> Result<RoutingEngine> {
        let providers = self
            .providers
            .ok_or_else(|| SdkError::ConfigError("provider gateway is required".to_string()))?;
        let rules = self
            .rules
            .ok_or_else(|| SdkError::ConfigError("routing rule gateway is required".to_string()))?;
        let configs = self
            .configs
            .ok_or_else(|| SdkError::ConfigError("provider config gateway is required".to_string()))?;
        let settings_gateway = self
            .settings
            .ok_or_else(|| SdkError::ConfigError("settings gateway is required".to_string()))?;

        let http: Arc<dyn HttpClient> = match self.http {
            Some(http) => http,
            None => Arc::new(ReqwestHttpClient::new(self.config.http.clone())?),
        };
        let registry = self
            .drivers
            .into_iter()
            .fold(DriverRegistry::with_builtin_drivers(http), |registry, driver| {
                registry.with_driver(driver)
            });
        let secrets = self
            .secrets
            .unwrap_or_else(|| Arc::new(EnvSecretSource::new(self.config.secret_prefix.clone())));

        let metrics = RoutingMetrics::new();
        let orchestrator = Arc::new(
            ServiceOrchestrator::new(providers, rules, configs, registry)
                .with_secret_source(secrets)
                .with_driver_timeout(self.config.driver_timeout())
                .with_metrics(metrics),
        );

        let settings =
            Arc::new(DynamicConfigService::new(settings_gateway).with_default_ttl(self.config.config_ttl_secs));
        settings.refresh().await?;

        let shipping = ShippingQuoteService::new(orchestrator.clone())
            .with_settings(settings.clone())
            .with_contingency(self.config.contingency.clone());
        let payments = PaymentService::new(orchestrator.clone());

        tracing::info!(
            "Routing engine ready: environment={}, drivers={:?}",
            self.config.environment,
            orchestrator.registry().driver_keys()
        );

        Ok(RoutingEngine {
            config: self.config,
            orchestrator,
            shipping,
            payments,
            settings,
        })
    }
}

impl Default for RoutingEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
