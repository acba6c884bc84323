//! Atelie SDK
//!
//! High-level API for resolving and executing service providers: the
//! orchestrator, the shipping and payment caller services, and the builder
//! that assembles them from a catalog.

pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod payment;
pub mod shipping;

// Re-export main types
pub use builder::RoutingEngineBuilder;
pub use config::{ContingencyConfig, EngineConfig, DEFAULT_ENVIRONMENT};
pub use engine::RoutingEngine;
pub use error::{Result, SdkError};
pub use orchestrator::{EligibleProvider, ServiceOrchestrator, FORCED_PROVIDER_KEY};
pub use payment::PaymentService;
pub use shipping::{ShippingQuote, ShippingQuoteRequest, ShippingQuoteService};

// Re-export commonly used types from dependencies
pub use atelie_core::{Payload, RouteContext, ServiceResult, ServiceType, Value};
pub use atelie_runtime::{DriverFailure, DriverOutcome, MetricsSnapshot, ServiceDriver};
