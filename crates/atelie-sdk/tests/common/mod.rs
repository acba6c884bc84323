//! Common test utilities for SDK integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use atelie_core::types::payload_from_json;
use atelie_core::{Payload, ServiceProvider, ServiceType};
use atelie_repository::InMemoryCatalog;
use atelie_runtime::{DriverFailure, DriverOutcome, ServiceDriver, StaticSecretSource};
use atelie_sdk::{EngineConfig, RoutingEngine, RoutingEngineBuilder};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const ENV: &str = "test";

/// Build a payload from a JSON object literal
pub fn payload(value: serde_json::Value) -> Payload {
    payload_from_json(value).expect("payload must be a JSON object")
}

pub fn shipping_provider(code: &str, priority: i32, driver_key: &str) -> ServiceProvider {
    ServiceProvider::new(ServiceType::Shipping, code, driver_key).with_priority(priority)
}

pub fn payment_provider(code: &str, priority: i32, driver_key: &str) -> ServiceProvider {
    ServiceProvider::new(ServiceType::Payment, code, driver_key).with_priority(priority)
}

/// What a [`ScriptedDriver`] does when executed
#[derive(Clone)]
pub enum Script {
    Respond(Payload),
    Fail(DriverFailure),
    Hang(Duration),
}

/// Driver with a fixed answer that counts its calls
pub struct ScriptedDriver {
    key: String,
    service_type: ServiceType,
    script: Script,
    calls: Arc<AtomicUsize>,
}

impl ScriptedDriver {
    pub fn new(key: &str, service_type: ServiceType, script: Script) -> Self {
        Self {
            key: key.to_string(),
            service_type,
            script,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl ServiceDriver for ScriptedDriver {
    fn driver_key(&self) -> &str {
        &self.key
    }

    fn service_type(&self) -> ServiceType {
        self.service_type
    }

    async fn execute(&self, _request: &Payload, _config: &Payload) -> DriverOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Respond(payload) => Ok(payload.clone()),
            Script::Fail(failure) => Err(failure.clone()),
            Script::Hang(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(Payload::new())
            }
        }
    }
}

/// Test helper assembling a RoutingEngine over an in-memory catalog
pub struct TestEngine {
    catalog: Arc<InMemoryCatalog>,
    config: EngineConfig,
    secrets: StaticSecretSource,
    drivers: Vec<Arc<dyn ServiceDriver>>,
}

impl TestEngine {
    pub fn new(catalog: InMemoryCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            config: EngineConfig::new().with_environment(ENV),
            secrets: StaticSecretSource::new(),
            drivers: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_secrets(mut self, secrets: StaticSecretSource) -> Self {
        self.secrets = secrets;
        self
    }

    pub fn with_driver(mut self, driver: impl ServiceDriver + 'static) -> Self {
        self.drivers.push(Arc::new(driver));
        self
    }

    pub fn catalog(&self) -> Arc<InMemoryCatalog> {
        self.catalog.clone()
    }

    pub async fn build(self) -> RoutingEngine {
        self.drivers
            .into_iter()
            .fold(
                RoutingEngineBuilder::new()
                    .with_config(self.config)
                    .with_catalog(self.catalog)
                    .with_secret_source(Arc::new(self.secrets)),
                |builder, driver| builder.with_driver(driver),
            )
            .build()
            .await
            .expect("engine should build")
    }
}
