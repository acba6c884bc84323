//! Read ports the routing engine consumes
//!
//! Persistence owns providers, rules and configuration; the engine only reads
//! them through these traits:
//!
//! - [`ProviderGateway`]: which providers exist for a service type
//! - [`RoutingRuleGateway`]: which rules decide eligibility
//! - [`ProviderConfigGateway`]: per-provider, per-environment config JSON
//! - [`SystemConfigGateway`]: flat key/value settings behind `DynamicConfigService`
//!
//! # Example
//!
//! ```no_run
//! use atelie_core::ServiceType;
//! use atelie_repository::{FileSystemCatalog, ProviderGateway};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = FileSystemCatalog::open("config/catalog.yaml").await?;
//!
//! for provider in catalog.find_enabled_by_type_ordered(ServiceType::Shipping).await? {
//!     println!("{} -> {}", provider.code, provider.driver_key);
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use atelie_core::{ServiceProvider, ServiceRoutingRule, ServiceType};

use crate::error::RepositoryResult;
use crate::models::SystemConfigEntry;

/// Read access to configured providers
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// Enabled providers of one type, ordered by priority ascending and then
    /// by code
    async fn find_enabled_by_type_ordered(
        &self,
        service_type: ServiceType,
    ) -> RepositoryResult<Vec<ServiceProvider>>;

    /// Look up one provider by code, enabled or not
    async fn find_by_code(
        &self,
        service_type: ServiceType,
        code: &str,
    ) -> RepositoryResult<Option<ServiceProvider>>;
}

/// Read access to routing rules
#[async_trait]
pub trait RoutingRuleGateway: Send + Sync {
    /// Enabled rules of one type, ordered by priority ascending
    async fn find_enabled_by_type_ordered(
        &self,
        service_type: ServiceType,
    ) -> RepositoryResult<Vec<ServiceRoutingRule>>;

    /// Enabled rules of one provider, keeping the type ordering
    async fn find_enabled_for_provider(
        &self,
        service_type: ServiceType,
        provider_code: &str,
    ) -> RepositoryResult<Vec<ServiceRoutingRule>> {
        Ok(self
            .find_enabled_by_type_ordered(service_type)
            .await?
            .into_iter()
            .filter(|rule| rule.provider_code == provider_code)
            .collect())
    }
}

/// Read access to provider configuration
#[async_trait]
pub trait ProviderConfigGateway: Send + Sync {
    /// Highest-version config JSON stored for the provider in `environment`
    async fn find_config_json(
        &self,
        provider_code: &str,
        environment: &str,
    ) -> RepositoryResult<Option<String>>;

    /// Re-read the backing store
    async fn refresh(&self) -> RepositoryResult<()>;
}

/// Read access to system settings
#[async_trait]
pub trait SystemConfigGateway: Send + Sync {
    async fn load_all(&self) -> RepositoryResult<Vec<SystemConfigEntry>>;
}
