//! Shipping Quote Demo
//!
//! Quotes a few orders against `config/catalog.yaml`:
//! - a large order tries the carrier API first, which is unreachable, then J3
//! - a Sao Paulo order is priced by J3's zone rule
//! - an order outside every zone degrades to the flat-rate contingency
//!
//! Run with `cargo run --example shipping_quote`.

use atelie_repository::FileSystemCatalog;
use atelie_sdk::{EngineConfig, RoutingEngineBuilder, ShippingQuoteRequest};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    println!("=== Shipping Quote Example ===\n");

    let catalog = Arc::new(FileSystemCatalog::open("config/catalog.yaml").await?);
    let engine = RoutingEngineBuilder::new()
        .with_config(EngineConfig::new().with_driver_timeout(Duration::from_secs(3)))
        .with_catalog(catalog)
        .build()
        .await?;

    let orders = [
        ("Large order in Sao Paulo", ShippingQuoteRequest::new("01310-100", 820.0)),
        ("Small order in Sao Paulo", ShippingQuoteRequest::new("01001-000", 120.0)),
        ("Order in Porto Alegre", ShippingQuoteRequest::new("90010-000", 480.0)),
        ("Order in Recife", ShippingQuoteRequest::new("50010-000", 75.0)),
    ];

    for (label, request) in &orders {
        println!("--- {} (CEP {}, subtotal {:.2}) ---", label, request.cep, request.subtotal);
        let quote = engine.quote_shipping(request).await?;

        println!("  Provider:      {} ({})", quote.provider, quote.provider_code);
        println!("  Cost:          {:.2}", quote.cost);
        println!("  Free shipping: {}", quote.free_shipping);
        println!("  Contingency:   {}", quote.contingency);
        if let Some(rule) = &quote.matched_rule {
            println!("  Matched rule:  {} ({})", rule.rule_id, rule.reason);
            if let Some(behavior) = &rule.behavior_json {
                println!("  Behavior:      {}", behavior);
            }
        }
        for attempt in &quote.attempts {
            println!("    tried {:<12} {:?}", attempt.provider_code, attempt.outcome);
        }
        println!();
    }

    println!("Metrics: {:?}", engine.metrics());
    Ok(())
}
