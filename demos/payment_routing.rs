//! Payment Routing Demo
//!
//! Payments have no contingency provider. With both gateways in
//! `config/catalog.yaml` unreachable the result is a failure carrying
//! `no_provider_available`, and nothing is substituted.
//!
//! Run with `cargo run --example payment_routing`.

use atelie_repository::FileSystemCatalog;
use atelie_sdk::{EngineConfig, Payload, RoutingEngineBuilder, Value};
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

    println!("=== Payment Routing Example ===\n");

    let catalog = Arc::new(FileSystemCatalog::open("config/catalog.yaml").await?);
    let engine = RoutingEngineBuilder::new()
        .with_config(EngineConfig::new().with_driver_timeout(Duration::from_secs(3)))
        .with_catalog(catalog)
        .build()
        .await?;

    let mut request = Payload::new();
    request.insert("order_id".to_string(), Value::from("A-1001"));
    request.insert("amount".to_string(), Value::from(249.9));
    request.insert("method".to_string(), Value::from("pix"));

    let result = engine.create_payment(&request).await?;

    println!("Success:  {}", result.success);
    println!("Provider: {:?}", result.provider_code);
    println!("Error:    {:?}", result.error);
    println!("Message:  {:?}", result.message);
    println!("Attempts:");
    for attempt in &result.attempts {
        println!("  {:<10} {:?}", attempt.provider_code, attempt.outcome);
    }
    println!("\nResult as JSON:\n{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
