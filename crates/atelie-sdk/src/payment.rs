//! Payment creation
//!
//! Payments have no safe default: exhaustion is returned as a failed
//! `ServiceResult` with error code `no_provider_available` and nothing is
//! substituted.

use crate::error::Result;
use crate::orchestrator::ServiceOrchestrator;
use atelie_core::{Payload, ServiceResult, ServiceType};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct PaymentService {
    orchestrator: Arc<ServiceOrchestrator>,
}

impl PaymentService {
    pub fn new(orchestrator: Arc<ServiceOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub async fn create_payment(&self, request: &Payload, environment: &str) -> Result<ServiceResult> {
        let result = self
            .orchestrator
            .resolve_and_execute(ServiceType::Payment, request, environment)
            .await?;

        if !result.success {
            tracing::warn!(
                "Payment could not be created: {} ({})",
                result.error_code().unwrap_or_default(),
                result.message.as_deref().unwrap_or_default()
            );
        }
        Ok(result)
    }
}
