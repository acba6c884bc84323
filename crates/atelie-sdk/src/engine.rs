//! Assembled routing engine

use crate::config::EngineConfig;
use crate::error::Result;
use crate::orchestrator::ServiceOrchestrator;
use crate::payment::PaymentService;
use crate::shipping::{ShippingQuote, ShippingQuoteRequest, ShippingQuoteService};
use atelie_core::{Payload, ServiceResult, ServiceType};
use atelie_runtime::{DynamicConfigService, MetricsSnapshot};
use std::sync::Arc;

/// Orchestrator plus the caller services sharing it
///
/// Built by [`RoutingEngineBuilder`](crate::RoutingEngineBuilder). Catalog
/// data is read on every resolution, while stored provider configs and
/// settings are refreshed explicitly through [`refresh`](Self::refresh).
#[derive(Debug)]
pub struct RoutingEngine {
    pub(crate) config: EngineConfig,
    pub(crate) orchestrator: Arc<ServiceOrchestrator>,
    pub(crate) shipping: ShippingQuoteService,
    pub(crate) payments: PaymentService,
    pub(crate) settings: Arc<DynamicConfigService>,
}

impl RoutingEngine {
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &Arc<ServiceOrchestrator> {
        &self.orchestrator
    }

    pub fn shipping(&self) -> &ShippingQuoteService {
        &self.shipping
    }

    pub fn payments(&self) -> &PaymentService {
        &self.payments
    }

    pub fn settings(&self) -> &Arc<DynamicConfigService> {
        &self.settings
    }

    /// Resolve and execute in the given environment, or the configured one
    pub async fn resolve_and_execute(
        &self,
        service_type: ServiceType,
        request: &Payload,
        environment: Option<&str>,
    ) -> Result<ServiceResult> {
        let environment = environment.unwrap_or(&self.config.environment);
        self.orchestrator
            .resolve_and_execute(service_type, request, environment)
            .await
    }

    /// Quote shipping in the configured environment
    pub async fn quote_shipping(&self, request: &ShippingQuoteRequest) -> Result<ShippingQuote> {
        self.shipping.quote(request, &self.config.environment).await
    }

    /// Create a payment in the configured environment
    pub async fn create_payment(&self, request: &Payload) -> Result<ServiceResult> {
        self.payments.create_payment(request, &self.config.environment).await
    }

    /// Reload stored provider configs and swap in a fresh settings snapshot
    pub async fn refresh(&self) -> Result<()> {
        self.orchestrator.refresh_configs().await?;
        let snapshot = self.settings.refresh().await?;
        tracing::info!("Routing engine refreshed (settings v{})", snapshot.version());
        Ok(())
    }

    /// Refresh only when the settings snapshot outlived its TTL
    pub async fn refresh_if_stale(&self) -> Result<bool> {
        if !self.settings.refresh_if_stale().await? {
            return Ok(false);
        }
        self.orchestrator.refresh_configs().await?;
        Ok(true)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.orchestrator.metrics().snapshot()
    }
}
