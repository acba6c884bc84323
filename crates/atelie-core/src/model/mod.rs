//! Domain model of the routing engine

pub mod provider;
pub mod route_context;
pub mod rule_match;
pub mod service_result;
pub mod service_type;

pub use provider::{ServiceProvider, ServiceRoutingRule};
pub use route_context::{digits_only, RouteContext, DEFAULT_COUNTRY};
pub use rule_match::{MatchReason, RuleMatch};
pub use service_result::{
    AttemptOutcome, MatchedRule, ProviderAttempt, ServiceResult, NO_PROVIDER_AVAILABLE,
    PROVIDER_MARKER,
};
pub use service_type::ServiceType;
