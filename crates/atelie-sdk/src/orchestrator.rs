//! Provider resolution and execution
//!
//! For one request the orchestrator walks the enabled providers of a service
//! type in `(priority, code)` order. Each provider is checked against its
//! routing rules, its driver is resolved and executed with the provider's
//! merged config, and the first successful call wins. Candidates that are
//! ineligible, misconfigured, failing or too slow are recorded and skipped.
//!
//! A request carrying [`FORCED_PROVIDER_KEY`] narrows the walk to that one
//! provider and skips its rules. The provider must still be enabled and have
//! a usable driver.

use crate::error::Result;
use atelie_core::{
    AttemptOutcome, MatchReason, MatchedRule, Payload, ProviderAttempt, RouteContext,
    ServiceProvider, ServiceResult, ServiceRoutingRule, ServiceType,
};
use atelie_repository::{ProviderConfigGateway, ProviderGateway, RoutingRuleGateway};
use atelie_runtime::{
    merge_provider_config, DriverFailure, DriverRegistry, EnvSecretSource, RoutingMetrics,
    RuleMatcher, SecretSource,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

const DEFAULT_DRIVER_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Request key naming a provider code that overrides routing
pub const FORCED_PROVIDER_KEY: &str = "forced_provider";

/// Forced provider code from the request, trimmed and upper-cased; blank
/// values are ignored
pub fn forced_provider(request: &Payload) -> Option<String> {
    request
        .get(FORCED_PROVIDER_KEY)
        .and_then(|v| v.to_display_string())
        .map(|code| code.trim().to_uppercase())
        .filter(|code| !code.is_empty())
}

/// A provider that passed rule evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct EligibleProvider {
    pub provider: ServiceProvider,
    /// `None` when the provider has no rules
    pub matched_rule: Option<MatchedRule>,
}

pub struct ServiceOrchestrator {
    providers: Arc<dyn ProviderGateway>,
    rules: Arc<dyn RoutingRuleGateway>,
    configs: Arc<dyn ProviderConfigGateway>,
    secrets: Arc<dyn SecretSource>,
    registry: DriverRegistry,
    matcher: RuleMatcher,
    metrics: RoutingMetrics,
    driver_timeout: Duration,
}

impl ServiceOrchestrator {
    pub fn new(
        providers: Arc<dyn ProviderGateway>,
        rules: Arc<dyn RoutingRuleGateway>,
        configs: Arc<dyn ProviderConfigGateway>,
        registry: DriverRegistry,
    ) -> Self {
        Self {
            providers,
            rules,
            configs,
            secrets: Arc::new(EnvSecretSource::default()),
            registry,
            matcher: RuleMatcher::new(),
            metrics: RoutingMetrics::new(),
            driver_timeout: DEFAULT_DRIVER_TIMEOUT,
        }
    }

    pub fn with_secret_source(mut self, secrets: Arc<dyn SecretSource>) -> Self {
        self.secrets = secrets;
        self
    }

    pub fn with_driver_timeout(mut self, driver_timeout: Duration) -> Self {
        self.driver_timeout = driver_timeout;
        self
    }

    pub fn with_metrics(mut self, metrics: RoutingMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn registry(&self) -> &DriverRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &RoutingMetrics {
        &self.metrics
    }

    pub fn driver_timeout(&self) -> Duration {
        self.driver_timeout
    }

    /// Re-read stored provider configs
    pub async fn refresh_configs(&self) -> Result<()> {
        self.configs.refresh().await?;
        Ok(())
    }

    /// Config a driver receives for `provider_code` in `environment`: the
    /// latest stored config JSON overlaid with secrets
    pub async fn provider_config(&self, provider_code: &str, environment: &str) -> Result<Payload> {
        let stored = self.configs.find_config_json(provider_code, environment).await?;
        let secrets = self.secrets.secrets_for(provider_code, environment);
        Ok(merge_provider_config(provider_code, stored.as_deref(), secrets)?)
    }

    /// Providers that pass rule evaluation for `ctx`, in routing order,
    /// without executing anything
    pub async fn eligible_providers(
        &self,
        service_type: ServiceType,
        ctx: &RouteContext,
    ) -> Result<Vec<EligibleProvider>> {
        let (providers, rules) = self.load_candidates(service_type).await?;

        Ok(providers
            .into_iter()
            .filter_map(|provider| {
                self.check_eligibility(&provider, &rules, ctx)
                    .ok()
                    .map(|matched_rule| EligibleProvider {
                        provider,
                        matched_rule,
                    })
            })
            .collect())
    }

    /// Resolve a provider for `service_type` and execute its driver
    ///
    /// Returns `Err` only when the catalog itself cannot be read. Every other
    /// failure ends as a `ServiceResult` with `success == false` and error
    /// code `no_provider_available`.
    pub async fn resolve_and_execute(
        &self,
        service_type: ServiceType,
        request: &Payload,
        environment: &str,
    ) -> Result<ServiceResult> {
        self.metrics.resolutions.inc();

        let ctx = RouteContext::from_request(request);
        let (mut providers, rules) = self.load_candidates(service_type).await?;
        let forced = forced_provider(request);
        if let Some(code) = &forced {
            tracing::info!("{} routing forced to provider {}", service_type, code);
            providers.retain(|p| &p.code == code);
        }
        tracing::debug!(
            "Resolving {} among {} provider(s) for country={} cep={} total={}",
            service_type,
            providers.len(),
            ctx.country,
            ctx.cep,
            ctx.order_total
        );

        let mut attempts = Vec::new();
        let mut last_failure: Option<DriverFailure> = None;

        for provider in &providers {
            let eligibility = if forced.is_some() {
                Ok(None)
            } else {
                self.check_eligibility(provider, &rules, &ctx)
            };
            let matched_rule = match eligibility {
                Ok(matched_rule) => matched_rule,
                Err(reasons) => {
                    tracing::debug!("Provider {} ineligible: {:?}", provider.code, reasons);
                    attempts.push(ProviderAttempt::new(&provider.code, AttemptOutcome::Ineligible { reasons }));
                    continue;
                }
            };

            let Some(driver) = self.registry.find_by_driver_key(&provider.driver_key) else {
                tracing::warn!(
                    "Provider {} references unknown driver '{}', skipping",
                    provider.code,
                    provider.driver_key
                );
                self.metrics.skipped.inc();
                attempts.push(ProviderAttempt::new(
                    &provider.code,
                    AttemptOutcome::DriverNotFound {
                        driver_key: provider.driver_key.clone(),
                    },
                ));
                continue;
            };

            if !driver.supports(service_type) {
                tracing::warn!(
                    "Driver '{}' of provider {} serves {}, not {}, skipping",
                    provider.driver_key,
                    provider.code,
                    driver.service_type(),
                    service_type
                );
                self.metrics.skipped.inc();
                attempts.push(ProviderAttempt::new(
                    &provider.code,
                    AttemptOutcome::UnsupportedServiceType {
                        driver_key: provider.driver_key.clone(),
                    },
                ));
                continue;
            }

            let config = match self.provider_config(&provider.code, environment).await {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Provider {} has unusable config, skipping: {}", provider.code, e);
                    self.metrics.skipped.inc();
                    attempts.push(ProviderAttempt::new(
                        &provider.code,
                        AttemptOutcome::ConfigurationError { message: e.to_string() },
                    ));
                    continue;
                }
            };

            let failure = match timeout(self.driver_timeout, driver.execute(request, &config)).await {
                Ok(Ok(payload)) => match DriverFailure::from_payload(&payload) {
                    None => {
                        tracing::info!("{} served by provider {}", service_type, provider.code);
                        self.metrics.successes.inc();
                        attempts.push(ProviderAttempt::new(&provider.code, AttemptOutcome::Succeeded));
                        return Ok(ServiceResult::success(provider.code.clone(), payload)
                            .with_matched_rule(matched_rule)
                            .with_attempts(attempts));
                    }
                    Some(failure) => failure,
                },
                Ok(Err(failure)) => failure,
                Err(_) => {
                    let after_ms = self.driver_timeout.as_millis() as u64;
                    tracing::warn!("Provider {} timed out after {}ms", provider.code, after_ms);
                    self.metrics.fallbacks.inc();
                    attempts.push(ProviderAttempt::new(&provider.code, AttemptOutcome::TimedOut { after_ms }));
                    last_failure = Some(DriverFailure::timeout(format!(
                        "provider {} timed out after {}ms",
                        provider.code, after_ms
                    )));
                    continue;
                }
            };

            tracing::warn!("Provider {} failed, trying next: {}", provider.code, failure);
            self.metrics.fallbacks.inc();
            attempts.push(ProviderAttempt::new(
                &provider.code,
                AttemptOutcome::Failed {
                    message: failure.to_string(),
                },
            ));
            last_failure = Some(failure);
        }

        self.metrics.exhaustions.inc();
        let message = match (&forced, providers.is_empty()) {
            (Some(code), true) => format!("forced {} provider {} is not enabled", service_type, code),
            (None, true) => format!("no enabled {} provider", service_type),
            _ => {
                let tried: Vec<&str> = attempts.iter().map(|a| a.provider_code.as_str()).collect();
                format!("no {} provider succeeded (candidates: {})", service_type, tried.join(", "))
            }
        };
        tracing::warn!("{}", message);

        let payload = last_failure.map(|f| f.to_payload()).unwrap_or_default();
        Ok(ServiceResult::no_provider_available()
            .with_message(message)
            .with_payload(payload)
            .with_attempts(attempts))
    }

    /// Enabled providers of the type in routing order, plus the type's
    /// enabled rules in evaluation order
    async fn load_candidates(
        &self,
        service_type: ServiceType,
    ) -> Result<(Vec<ServiceProvider>, Vec<ServiceRoutingRule>)> {
        let mut providers: Vec<ServiceProvider> = self
            .providers
            .find_enabled_by_type_ordered(service_type)
            .await?
            .into_iter()
            .filter(|p| p.enabled && p.service_type == service_type)
            .collect();
        providers.sort_by(ServiceProvider::routing_order);

        let mut rules: Vec<ServiceRoutingRule> = self
            .rules
            .find_enabled_by_type_ordered(service_type)
            .await?
            .into_iter()
            .filter(|r| r.enabled && r.service_type == service_type)
            .collect();
        rules.sort_by(ServiceRoutingRule::evaluation_order);

        Ok((providers, rules))
    }

    /// `Ok(rule)` when eligible: the first matching rule, or `None` when the
    /// provider has no rules. The first definitive mismatch ends evaluation;
    /// broken rules are skipped. `Err` carries the reasons seen so far.
    fn check_eligibility(
        &self,
        provider: &ServiceProvider,
        rules: &[ServiceRoutingRule],
        ctx: &RouteContext,
    ) -> std::result::Result<Option<MatchedRule>, Vec<MatchReason>> {
        let mut reasons = Vec::new();

        for rule in rules.iter().filter(|r| r.provider_code == provider.code) {
            let result = self.matcher.matches(ctx, &rule.match_json);
            if result.matched {
                tracing::debug!("Provider {} eligible via rule {} ({})", provider.code, rule.id, result.reason);
                return Ok(Some(MatchedRule {
                    rule_id: rule.id,
                    reason: result.reason,
                    behavior_json: rule.behavior_json.clone(),
                }));
            }

            reasons.push(result.reason);
            if !result.reason.is_rule_defect() {
                tracing::debug!("Provider {} declined by rule {} ({})", provider.code, rule.id, result.reason);
                return Err(reasons);
            }

            tracing::warn!(
                "Rule {} of provider {} is broken ({}): {}",
                rule.id,
                provider.code,
                result.reason,
                result.detail.as_deref().unwrap_or("")
            );
        }

        if reasons.is_empty() {
            Ok(None)
        } else {
            Err(reasons)
        }
    }
}

impl std::fmt::Debug for ServiceOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceOrchestrator")
            .field("registry", &self.registry)
            .field("driver_timeout", &self.driver_timeout)
            .finish()
    }
}
