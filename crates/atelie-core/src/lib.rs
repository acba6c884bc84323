//! Atelie Core - Core types for the Atelie service routing engine
//!
//! This crate provides the fundamental types used across the workspace:
//! - `Value` and `Payload` for requests, driver results and provider config
//! - AST definitions for rule expressions and the decoded `MatchSpec`
//! - The routing domain model (providers, rules, contexts, results)
//! - Error types

pub mod ast;
pub mod error;
pub mod model;
pub mod types;

// Re-export commonly used types
pub use error::CoreError;
pub use model::{
    AttemptOutcome, MatchReason, MatchedRule, ProviderAttempt, RouteContext, RuleMatch,
    ServiceProvider, ServiceResult, ServiceRoutingRule, ServiceType,
};
pub use types::{Payload, Value};
