//! Routing engine initialization
//!
//! Picks the catalog backend from the `--catalog` argument and hands it to
//! the SDK builder together with the loaded [`EngineConfig`].

use anyhow::Result;
use atelie_repository::FileSystemCatalog;
use atelie_sdk::{EngineConfig, RoutingEngine, RoutingEngineBuilder};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Where the service catalog comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// YAML or JSON document on disk
    File(PathBuf),
    /// PostgreSQL tables
    Postgres(String),
}

impl CatalogSource {
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("postgres://") || raw.starts_with("postgresql://") {
            CatalogSource::Postgres(raw.to_string())
        } else {
            CatalogSource::File(PathBuf::from(raw))
        }
    }
}

/// Build the engine over the given catalog
pub async fn init_engine(source: &CatalogSource, config: EngineConfig) -> Result<RoutingEngine> {
    let builder = RoutingEngineBuilder::new().with_config(config);

    let builder = match source {
        CatalogSource::File(path) => {
            info!("Loading service catalog from {}", path.display());
            let catalog = FileSystemCatalog::open(path)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to open catalog {}: {}", path.display(), e))?;
            builder.with_catalog(Arc::new(catalog))
        }
        CatalogSource::Postgres(url) => {
            #[cfg(feature = "postgres")]
            {
                use atelie_repository::PostgresCatalog;
                info!("Loading service catalog from PostgreSQL");
                let catalog = PostgresCatalog::connect(url)
                    .await
                    .map_err(|e| anyhow::anyhow!("Failed to connect to catalog database: {}", e))?;
                builder.with_catalog(Arc::new(catalog))
            }
            #[cfg(not(feature = "postgres"))]
            {
                let _ = url;
                tracing::warn!("PostgreSQL catalog feature not enabled");
                return Err(anyhow::anyhow!(
                    "Enable the 'postgres' feature to read the catalog from PostgreSQL"
                ));
            }
        }
    };

    let engine = builder.build().await?;
    info!("Routing engine initialized");
    Ok(engine)
}
