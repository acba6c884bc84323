//! Subcommand execution
//!
//! Every command produces a JSON document; printing is left to `main`.

use crate::cli::{read_json_arg, Cli, Command};
use crate::engine::{init_engine, CatalogSource};
use anyhow::Result;
use atelie_core::types::payload_from_json;
use atelie_core::{Payload, RouteContext, ServiceType};
use atelie_runtime::RuleMatcher;
use atelie_sdk::{EngineConfig, ShippingQuoteRequest};
use serde_json::json;

pub async fn run(cli: Cli) -> Result<serde_json::Value> {
    let Cli {
        catalog, env, command, ..
    } = cli;

    // rule evaluation needs no catalog
    if let Command::Match { rule, context } = &command {
        return match_rule(rule, context);
    }

    let mut config = EngineConfig::load()?;
    if let Some(env) = env {
        config = config.with_environment(env);
    }
    let environment = config.environment.clone();
    let engine = init_engine(&CatalogSource::parse(&catalog), config).await?;

    match command {
        Command::Resolve { service_type, request } => {
            let service_type: ServiceType = service_type.parse()?;
            let request = request_payload(&request)?;
            let result = engine
                .resolve_and_execute(service_type, &request, Some(&environment))
                .await?;
            Ok(serde_json::to_value(result)?)
        }
        Command::Eligible { service_type, request } => {
            let service_type: ServiceType = service_type.parse()?;
            let ctx = RouteContext::from_request(&request_payload(&request)?);
            let eligible = engine.orchestrator().eligible_providers(service_type, &ctx).await?;
            Ok(eligible
                .into_iter()
                .map(|e| {
                    json!({
                        "provider_code": e.provider.code,
                        "driver_key": e.provider.driver_key,
                        "priority": e.provider.priority,
                        "matched_rule": e.matched_rule,
                    })
                })
                .collect())
        }
        Command::Quote {
            cep,
            subtotal,
            country,
            forced_provider,
        } => {
            let mut request = ShippingQuoteRequest::new(cep, subtotal);
            if let Some(country) = country {
                request = request.with_country(country);
            }
            if let Some(code) = forced_provider {
                request = request.with_forced_provider(code);
            }
            let quote = engine.shipping().quote(&request, &environment).await?;
            Ok(serde_json::to_value(quote)?)
        }
        Command::Drivers => Ok(json!(engine.orchestrator().registry().driver_keys())),
        Command::Match { rule, context } => match_rule(&rule, &context),
    }
}

fn request_payload(raw: &str) -> Result<Payload> {
    payload_from_json(read_json_arg(raw)?).ok_or_else(|| anyhow::anyhow!("Request must be a JSON object"))
}

fn match_rule(rule: &str, context: &str) -> Result<serde_json::Value> {
    let ctx = RouteContext::from_request(&request_payload(context)?);
    let result = RuleMatcher::new().matches(&ctx, rule);
    Ok(json!({
        "context": {
            "country": ctx.country,
            "cep": ctx.cep,
            "cepDigits": ctx.cep_digits(),
            "orderTotal": ctx.order_total,
        },
        "matched": result.matched,
        "reason": result.reason,
        "detail": result.detail,
    }))
}
