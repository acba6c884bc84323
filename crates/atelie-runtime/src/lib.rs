//! Atelie Runtime - Rule matching, drivers and dynamic configuration
//!
//! This crate provides the pieces the orchestrator composes:
//! - [`RuleMatcher`]: evaluates a routing rule's `match_json` against a context
//! - [`ServiceDriver`] and the built-in drivers, indexed by [`DriverRegistry`]
//! - [`DynamicConfigService`], secret sources and provider config merging
//! - [`RoutingMetrics`] counters

pub mod config;
pub mod driver;
pub mod error;
pub mod matcher;
pub mod metrics;

// Re-export main types
pub use config::{
    merge_provider_config, ConfigSnapshot, DynamicConfigService, EnvSecretSource, SecretSource,
    StaticSecretSource,
};
pub use driver::{
    DriverFailure, DriverOutcome, DriverRegistry, FailureKind, HttpClient, HttpSettings,
    ReqwestHttpClient, ServiceDriver,
};
pub use error::{Result, RuntimeError};
pub use matcher::{ExpressionEvaluator, RuleMatcher};
pub use metrics::{MetricsSnapshot, RoutingMetrics};
