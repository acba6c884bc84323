//! File system based catalog
//!
//! Reads a single YAML (or JSON) catalog document from disk into an
//! [`InMemoryCatalog`]. `refresh()` re-reads the file and swaps the content.

use async_trait::async_trait;
use atelie_core::{ServiceProvider, ServiceRoutingRule, ServiceType};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{RepositoryError, RepositoryResult};
use crate::memory::InMemoryCatalog;
use crate::models::{CatalogDocument, SystemConfigEntry};
use crate::traits::{ProviderConfigGateway, ProviderGateway, RoutingRuleGateway, SystemConfigGateway};

/// Catalog backed by one file on disk
#[derive(Debug)]
pub struct FileSystemCatalog {
    path: PathBuf,
    catalog: InMemoryCatalog,
}

impl FileSystemCatalog {
    /// Open and load the catalog file
    ///
    /// # Example
    /// ```no_run
    /// use atelie_repository::FileSystemCatalog;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let catalog = FileSystemCatalog::open("config/catalog.yaml").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn open<P: AsRef<Path>>(path: P) -> RepositoryResult<Self> {
        let path = path.as_ref().to_path_buf();
        let doc = Self::read_document(&path).await?;
        let catalog = InMemoryCatalog::from_document(doc)?;

        tracing::info!("Loaded service catalog from {}", path.display());
        Ok(Self { path, catalog })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Underlying in-memory catalog
    pub fn catalog(&self) -> &InMemoryCatalog {
        &self.catalog
    }

    /// Re-read the file. On error the previous content stays in place.
    pub async fn reload(&self) -> RepositoryResult<()> {
        let doc = Self::read_document(&self.path).await?;
        self.catalog.replace_with(doc).await?;
        tracing::info!("Reloaded service catalog from {}", self.path.display());
        Ok(())
    }

    async fn read_document(path: &Path) -> RepositoryResult<CatalogDocument> {
        if !fs::try_exists(path).await? {
            return Err(RepositoryError::NotFound {
                path: path.display().to_string(),
            });
        }

        let content = fs::read_to_string(path).await?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(serde_yaml::from_str(&content)?)
        }
    }
}

#[async_trait]
impl ProviderGateway for FileSystemCatalog {
    async fn find_enabled_by_type_ordered(
        &self,
        service_type: ServiceType,
    ) -> RepositoryResult<Vec<ServiceProvider>> {
        ProviderGateway::find_enabled_by_type_ordered(&self.catalog, service_type).await
    }

    async fn find_by_code(
        &self,
        service_type: ServiceType,
        code: &str,
    ) -> RepositoryResult<Option<ServiceProvider>> {
        self.catalog.find_by_code(service_type, code).await
    }
}

#[async_trait]
impl RoutingRuleGateway for FileSystemCatalog {
    async fn find_enabled_by_type_ordered(
        &self,
        service_type: ServiceType,
    ) -> RepositoryResult<Vec<ServiceRoutingRule>> {
        RoutingRuleGateway::find_enabled_by_type_ordered(&self.catalog, service_type).await
    }
}

#[async_trait]
impl ProviderConfigGateway for FileSystemCatalog {
    async fn find_config_json(
        &self,
        provider_code: &str,
        environment: &str,
    ) -> RepositoryResult<Option<String>> {
        self.catalog.find_config_json(provider_code, environment).await
    }

    async fn refresh(&self) -> RepositoryResult<()> {
        self.reload().await
    }
}

#[async_trait]
impl SystemConfigGateway for FileSystemCatalog {
    async fn load_all(&self) -> RepositoryResult<Vec<SystemConfigEntry>> {
        self.catalog.load_all().await
    }
}
