//! Catalog and settings changes without a restart

mod common;

use atelie_core::{ServiceRoutingRule, ServiceType, Value};
use atelie_repository::{FileSystemCatalog, InMemoryCatalog, ProviderConfigRecord};
use atelie_runtime::StaticSecretSource;
use atelie_sdk::{EngineConfig, RoutingEngineBuilder, ShippingQuoteRequest};
use common::{payload, shipping_provider, TestEngine, ENV};
use serde_json::json;
use std::sync::Arc;

fn request() -> atelie_core::Payload {
    payload(json!({"cep": "01001-000", "subtotal": 150}))
}

#[tokio::test]
async fn provider_changes_apply_to_the_next_request() {
    let test_engine = TestEngine::new(
        InMemoryCatalog::new()
            .with_provider(shipping_provider("FAST", 1, "shipping.zone"))
            .with_provider(shipping_provider("SLOW", 2, "shipping.zone"))
            .with_config(ProviderConfigRecord::new("FAST", ENV, r#"{"rate": 30}"#))
            .with_config(ProviderConfigRecord::new("SLOW", ENV, r#"{"rate": 10}"#)),
    );
    let catalog = test_engine.catalog();
    let engine = test_engine.build().await;

    let result = engine.resolve_and_execute(ServiceType::Shipping, &request(), None).await.unwrap();
    assert_eq!(result.provider_code.as_deref(), Some("FAST"));

    catalog
        .set_provider_enabled(ServiceType::Shipping, "FAST", false)
        .await
        .unwrap();
    let result = engine.resolve_and_execute(ServiceType::Shipping, &request(), None).await.unwrap();
    assert_eq!(result.provider_code.as_deref(), Some("SLOW"));

    catalog
        .put_config(ProviderConfigRecord::new("SLOW", ENV, r#"{"rate": 12}"#).with_version(2))
        .await;
    catalog
        .upsert_rule(ServiceRoutingRule::new(ServiceType::Shipping, "SLOW", r#"{"min_total": 100}"#))
        .await;
    let result = engine.resolve_and_execute(ServiceType::Shipping, &request(), None).await.unwrap();
    assert_eq!(result.payload_value("cost"), Some(&Value::Number(12.0)));
    assert!(result.matched_rule.is_some());
}

#[tokio::test]
async fn settings_change_after_explicit_refresh() {
    let test_engine = TestEngine::new(InMemoryCatalog::new().with_setting("FLAT_RATE", "19.90"));
    let catalog = test_engine.catalog();
    let engine = test_engine.build().await;
    let quote_request = ShippingQuoteRequest::new("01001-000", 50.0);

    let quote = engine.quote_shipping(&quote_request).await.unwrap();
    assert!(quote.contingency);
    assert_eq!(quote.cost, 19.9);

    catalog.put_setting("FLAT_RATE", "24.90").await;
    let quote = engine.quote_shipping(&quote_request).await.unwrap();
    assert_eq!(quote.cost, 19.9);

    let version = engine.settings().snapshot().version();
    engine.refresh().await.unwrap();
    assert_eq!(engine.settings().snapshot().version(), version + 1);

    let quote = engine.quote_shipping(&quote_request).await.unwrap();
    assert_eq!(quote.cost, 24.9);
}

#[tokio::test]
async fn file_catalog_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.yaml");
    let catalog_yaml = |rate: f64| {
        format!(
            r#"
providers:
  - service_type: SHIPPING
    code: J3
    driver_key: shipping.j3
    priority: 1
rules:
  - service_type: SHIPPING
    provider_code: J3
    match: {{ cep_prefix: ["010", "011"] }}
    behavior: {{ badge: express }}
provider_configs:
  - provider_code: J3
    environment: {env}
    config: {{ rate: {rate}, free_threshold: 299, provider_label: J3 }}
settings:
  FLAT_RATE: 29.9
"#,
            env = ENV,
            rate = rate
        )
    };
    tokio::fs::write(&path, catalog_yaml(15.0)).await.unwrap();

    let engine = RoutingEngineBuilder::new()
        .with_config(EngineConfig::new().with_environment(ENV))
        .with_catalog(Arc::new(FileSystemCatalog::open(&path).await.unwrap()))
        .with_secret_source(Arc::new(StaticSecretSource::new()))
        .build()
        .await
        .unwrap();

    let quote = engine
        .quote_shipping(&ShippingQuoteRequest::new("01001-000", 100.0))
        .await
        .unwrap();
    assert_eq!(quote.provider, "J3");
    assert_eq!(quote.cost, 15.0);
    let behavior = quote.matched_rule.and_then(|r| r.behavior_json).unwrap();
    assert_eq!(serde_json::from_str::<serde_json::Value>(&behavior).unwrap(), json!({"badge": "express"}));

    tokio::fs::write(&path, catalog_yaml(17.5)).await.unwrap();
    engine.refresh().await.unwrap();

    let quote = engine
        .quote_shipping(&ShippingQuoteRequest::new("01001-000", 100.0))
        .await
        .unwrap();
    assert_eq!(quote.cost, 17.5);

    // outside the zone the contingency rate from the file applies
    let quote = engine
        .quote_shipping(&ShippingQuoteRequest::new("99999-000", 100.0))
        .await
        .unwrap();
    assert!(quote.contingency);
    assert_eq!(quote.cost, 29.9);
}
