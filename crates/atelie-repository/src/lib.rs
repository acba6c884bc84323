//! Catalog abstraction layer for the Atelie service routing engine
//!
//! This crate provides the read ports the engine resolves providers through,
//! plus storage backends implementing them.
//!
//! # Features
//!
//! - **In-memory catalog**: programmatic setup for tests and embedding
//! - **File system catalog**: one YAML/JSON document on disk, reloadable
//! - **PostgreSQL catalog**: database-backed tables (feature `postgres`)
//!
//! # Quick Start
//!
//! ```no_run
//! use atelie_core::ServiceType;
//! use atelie_repository::{FileSystemCatalog, ProviderConfigGateway, RoutingRuleGateway};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = FileSystemCatalog::open("config/catalog.yaml").await?;
//!
//!     let rules = catalog.find_enabled_for_provider(ServiceType::Shipping, "J3").await?;
//!     println!("J3 has {} routing rules", rules.len());
//!
//!     let config = catalog.find_config_json("J3", "production").await?;
//!     println!("J3 config: {:?}", config);
//!
//!     // Pick up edits made to the file
//!     catalog.refresh().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Catalog document
//!
//! ```yaml
//! providers:
//!   - service_type: SHIPPING
//!     code: J3
//!     driver_key: shipping.j3
//!     priority: 1
//! rules:
//!   - service_type: SHIPPING
//!     provider_code: J3
//!     match: { cep_prefix: ["010", "011"] }
//! provider_configs:
//!   - provider_code: J3
//!     environment: production
//!     config: { rate: 15.0, free_threshold: 299.0 }
//! settings:
//!   FLAT_RATE: 29.9
//! ```

pub mod error;
pub mod file_system;
pub mod memory;
pub mod models;
pub mod traits;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use error::{RepositoryError, RepositoryResult};
pub use file_system::FileSystemCatalog;
pub use memory::InMemoryCatalog;
pub use models::{CatalogDocument, ProviderConfigRecord, SystemConfigEntry};
pub use traits::{ProviderConfigGateway, ProviderGateway, RoutingRuleGateway, SystemConfigGateway};

#[cfg(feature = "postgres")]
pub use postgres::PostgresCatalog;
