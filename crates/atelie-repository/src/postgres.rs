//! PostgreSQL catalog implementation
//!
//! Expected tables:
//! - `service_providers (id, service_type, code, name, enabled, priority, driver_key, health_enabled)`
//! - `service_routing_rules (id, service_type, provider_code, enabled, priority, match_json, behavior_json)`
//! - `service_provider_configs (provider_code, environment, config_json, version)`
//! - `system_configs (config_key, config_value)`

use async_trait::async_trait;
use atelie_core::{ServiceProvider, ServiceRoutingRule, ServiceType};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::error::{RepositoryError, RepositoryResult};
use crate::models::SystemConfigEntry;
use crate::traits::{ProviderConfigGateway, ProviderGateway, RoutingRuleGateway, SystemConfigGateway};

/// PostgreSQL-backed catalog. Every call reads through to the database.
#[derive(Debug, Clone)]
pub struct PostgresCatalog {
    pool: PgPool,
}

impl PostgresCatalog {
    /// Connect to the database
    ///
    /// # Example
    /// ```no_run
    /// use atelie_repository::PostgresCatalog;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let catalog = PostgresCatalog::connect("postgresql://localhost/atelie").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(database_url: &str) -> RepositoryResult<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Use an existing pool
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn service_type(row: &PgRow) -> RepositoryResult<ServiceType> {
        let raw: String = row.try_get("service_type")?;
        raw.parse()
            .map_err(|e: atelie_core::CoreError| RepositoryError::ParseError(e.to_string()))
    }

    fn provider_from_row(row: &PgRow) -> RepositoryResult<ServiceProvider> {
        Ok(ServiceProvider {
            id: row.try_get("id")?,
            service_type: Self::service_type(row)?,
            code: row.try_get("code")?,
            name: row.try_get::<Option<String>, _>("name")?.unwrap_or_default(),
            enabled: row.try_get("enabled")?,
            priority: row.try_get("priority")?,
            driver_key: row.try_get("driver_key")?,
            health_enabled: row.try_get("health_enabled")?,
        })
    }

    fn rule_from_row(row: &PgRow) -> RepositoryResult<ServiceRoutingRule> {
        Ok(ServiceRoutingRule {
            id: row.try_get("id")?,
            service_type: Self::service_type(row)?,
            provider_code: row.try_get("provider_code")?,
            enabled: row.try_get("enabled")?,
            priority: row.try_get("priority")?,
            match_json: row
                .try_get::<Option<String>, _>("match_json")?
                .unwrap_or_else(|| "{}".to_string()),
            behavior_json: row.try_get("behavior_json")?,
        })
    }
}

#[async_trait]
impl ProviderGateway for PostgresCatalog {
    async fn find_enabled_by_type_ordered(
        &self,
        service_type: ServiceType,
    ) -> RepositoryResult<Vec<ServiceProvider>> {
        let rows = sqlx::query(
            r#"
            SELECT id, service_type, code, name, enabled, priority, driver_key, health_enabled
            FROM service_providers
            WHERE service_type = $1 AND enabled = TRUE
            ORDER BY priority ASC, code ASC
            "#,
        )
        .bind(service_type.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::provider_from_row).collect()
    }

    async fn find_by_code(
        &self,
        service_type: ServiceType,
        code: &str,
    ) -> RepositoryResult<Option<ServiceProvider>> {
        let row = sqlx::query(
            r#"
            SELECT id, service_type, code, name, enabled, priority, driver_key, health_enabled
            FROM service_providers
            WHERE service_type = $1 AND code = $2
            "#,
        )
        .bind(service_type.as_str())
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::provider_from_row).transpose()
    }
}

#[async_trait]
impl RoutingRuleGateway for PostgresCatalog {
    async fn find_enabled_by_type_ordered(
        &self,
        service_type: ServiceType,
    ) -> RepositoryResult<Vec<ServiceRoutingRule>> {
        let rows = sqlx::query(
            r#"
            SELECT id, service_type, provider_code, enabled, priority, match_json, behavior_json
            FROM service_routing_rules
            WHERE service_type = $1 AND enabled = TRUE
            ORDER BY priority ASC, id ASC
            "#,
        )
        .bind(service_type.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::rule_from_row).collect()
    }

    async fn find_enabled_for_provider(
        &self,
        service_type: ServiceType,
        provider_code: &str,
    ) -> RepositoryResult<Vec<ServiceRoutingRule>> {
        let rows = sqlx::query(
            r#"
            SELECT id, service_type, provider_code, enabled, priority, match_json, behavior_json
            FROM service_routing_rules
            WHERE service_type = $1 AND provider_code = $2 AND enabled = TRUE
            ORDER BY priority ASC, id ASC
            "#,
        )
        .bind(service_type.as_str())
        .bind(provider_code)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::rule_from_row).collect()
    }
}

#[async_trait]
impl ProviderConfigGateway for PostgresCatalog {
    async fn find_config_json(
        &self,
        provider_code: &str,
        environment: &str,
    ) -> RepositoryResult<Option<String>> {
        let row = sqlx::query(
            r#"
            SELECT config_json
            FROM service_provider_configs
            WHERE provider_code = $1 AND environment = $2
            ORDER BY version DESC
            LIMIT 1
            "#,
        )
        .bind(provider_code)
        .bind(environment)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .map(|r| r.try_get::<String, _>("config_json"))
            .transpose()?)
    }

    async fn refresh(&self) -> RepositoryResult<()> {
        // Reads always hit the database
        Ok(())
    }
}

#[async_trait]
impl SystemConfigGateway for PostgresCatalog {
    async fn load_all(&self) -> RepositoryResult<Vec<SystemConfigEntry>> {
        let rows = sqlx::query("SELECT config_key, config_value FROM system_configs")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> RepositoryResult<SystemConfigEntry> {
                Ok(SystemConfigEntry {
                    key: row.try_get("config_key")?,
                    value: row.try_get("config_value")?,
                })
            })
            .collect()
    }
}
