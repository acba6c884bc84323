//! Fallback, timeout and contingency behavior

mod common;

use atelie_core::{AttemptOutcome, ServiceRoutingRule, ServiceType, Value};
use atelie_repository::{InMemoryCatalog, ProviderConfigRecord};
use atelie_runtime::DriverFailure;
use atelie_sdk::{ContingencyConfig, EngineConfig, SdkError, ShippingQuoteRequest};
use common::{payload, payment_provider, shipping_provider, Script, ScriptedDriver, TestEngine, ENV};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::time::Duration;

fn failing_carrier() -> ScriptedDriver {
    ScriptedDriver::new(
        "shipping.carrier",
        ServiceType::Shipping,
        Script::Fail(DriverFailure::transport("connection reset")),
    )
}

#[tokio::test]
async fn single_failing_shipping_provider_degrades_to_flat_rate() {
    let engine = TestEngine::new(
        InMemoryCatalog::new()
            .with_provider(shipping_provider("CARRIER", 1, "shipping.carrier"))
            .with_setting("FLAT_RATE", "29.90")
            .with_setting("FLAT_FREE_SHIPPING_THRESHOLD", "500"),
    )
    .with_driver(failing_carrier())
    .build()
    .await;

    let quote = engine
        .quote_shipping(&ShippingQuoteRequest::new("01001-000", 120.0))
        .await
        .unwrap();

    assert!(quote.contingency);
    assert_eq!(quote.provider_code, "FLAT_RATE");
    assert_eq!(quote.provider, "FLAT_RATE");
    assert_eq!(quote.cost, 29.9);
    assert_eq!(quote.threshold, Some(500.0));
    assert!(matches!(quote.attempts[0].outcome, AttemptOutcome::Failed { .. }));

    let metrics = engine.metrics();
    assert_eq!(metrics.contingency_hops, 1);
    assert_eq!(metrics.exhaustions, 1);
    assert_eq!(metrics.fallbacks, 1);
}

#[tokio::test]
async fn contingency_config_layers() {
    let contingency = ContingencyConfig::default().with_rate(10.0).with_free_threshold(100.0);
    let catalog = || {
        InMemoryCatalog::new()
            .with_provider(shipping_provider("CARRIER", 1, "shipping.carrier"))
            .with_setting("FLAT_RATE", "15")
    };

    // engine defaults < settings
    let engine = TestEngine::new(catalog())
        .with_config(EngineConfig::new().with_environment(ENV).with_contingency(contingency.clone()))
        .with_driver(failing_carrier())
        .build()
        .await;
    let quote = engine
        .quote_shipping(&ShippingQuoteRequest::new("01001-000", 50.0))
        .await
        .unwrap();
    assert_eq!(quote.cost, 15.0);
    assert_eq!(quote.threshold, Some(100.0));

    // settings < stored provider config
    let engine = TestEngine::new(catalog().with_config(ProviderConfigRecord::new(
        "FLAT_RATE",
        ENV,
        r#"{"rate": 18, "free_threshold": 40, "provider_label": "Correios offline"}"#,
    )))
    .with_config(EngineConfig::new().with_environment(ENV).with_contingency(contingency))
    .with_driver(failing_carrier())
    .build()
    .await;
    let quote = engine
        .quote_shipping(&ShippingQuoteRequest::new("01001-000", 50.0))
        .await
        .unwrap();
    assert_eq!(quote.provider, "Correios offline");
    assert!(quote.free_shipping);
    assert_eq!(quote.cost, 0.0);
}

#[tokio::test]
async fn contingency_without_rate_fails_loudly() {
    let engine = TestEngine::new(InMemoryCatalog::new().with_provider(shipping_provider(
        "CARRIER",
        1,
        "shipping.carrier",
    )))
    .with_driver(failing_carrier())
    .build()
    .await;

    let err = engine
        .quote_shipping(&ShippingQuoteRequest::new("01001-000", 50.0))
        .await
        .unwrap_err();

    assert!(matches!(err, SdkError::ContingencyFailed { ref provider_code, .. } if provider_code == "FLAT_RATE"));
    assert!(err.to_string().contains("rate"));
}

#[tokio::test]
async fn malformed_flat_rate_setting_fails_contingency() {
    let engine = TestEngine::new(
        InMemoryCatalog::new()
            .with_provider(shipping_provider("CARRIER", 1, "shipping.carrier"))
            .with_setting("FLAT_RATE", "cheap"),
    )
    .with_driver(failing_carrier())
    .build()
    .await;

    let result = engine
        .quote_shipping(&ShippingQuoteRequest::new("01001-000", 50.0))
        .await;

    assert!(matches!(result, Err(SdkError::ContingencyFailed { .. })));
}

#[tokio::test]
async fn failure_moves_to_next_provider_without_contingency() {
    let backup = ScriptedDriver::new(
        "shipping.backup",
        ServiceType::Shipping,
        Script::Respond(payload(json!({"cost": 31.5, "provider": "Backup"}))),
    );
    let backup_calls = backup.calls();
    let engine = TestEngine::new(
        InMemoryCatalog::new()
            .with_provider(shipping_provider("CARRIER", 1, "shipping.carrier"))
            .with_provider(shipping_provider("BACKUP", 2, "shipping.backup"))
            .with_setting("FLAT_RATE", "29.90"),
    )
    .with_driver(failing_carrier())
    .with_driver(backup)
    .build()
    .await;

    let quote = engine
        .quote_shipping(&ShippingQuoteRequest::new("01001-000", 50.0))
        .await
        .unwrap();

    assert_eq!(quote.provider_code, "BACKUP");
    assert_eq!(quote.cost, 31.5);
    assert!(!quote.contingency);
    assert_eq!(backup_calls.load(Ordering::SeqCst), 1);
    assert_eq!(engine.metrics().contingency_hops, 0);
}

#[tokio::test(start_paused = true)]
async fn timed_out_provider_is_treated_as_failure() {
    let slow = ScriptedDriver::new("payment.slow", ServiceType::Payment, Script::Hang(Duration::from_secs(60)));
    let fast = ScriptedDriver::new(
        "payment.fast",
        ServiceType::Payment,
        Script::Respond(payload(json!({"status": "approved", "payment_id": "pay_1"}))),
    );
    let engine = TestEngine::new(
        InMemoryCatalog::new()
            .with_provider(payment_provider("SLOW", 1, "payment.slow"))
            .with_provider(payment_provider("FAST", 2, "payment.fast")),
    )
    .with_config(
        EngineConfig::new()
            .with_environment(ENV)
            .with_driver_timeout(Duration::from_millis(250)),
    )
    .with_driver(slow)
    .with_driver(fast)
    .build()
    .await;

    let result = engine
        .create_payment(&payload(json!({"amount": 50})))
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.provider_code.as_deref(), Some("FAST"));
    assert_eq!(result.attempts[0].outcome, AttemptOutcome::TimedOut { after_ms: 250 });
    assert_eq!(result.payload_value("provider"), Some(&Value::from("FAST")));
}

#[tokio::test]
async fn unknown_driver_key_is_skipped() {
    let engine = TestEngine::new(
        InMemoryCatalog::new()
            .with_provider(shipping_provider("LEGACY", 1, "shipping.retired"))
            .with_provider(shipping_provider("ZONE", 2, "shipping.zone"))
            .with_config(ProviderConfigRecord::new("ZONE", ENV, r#"{"rate": 9}"#)),
    )
    .build()
    .await;

    let result = engine
        .resolve_and_execute(
            ServiceType::Shipping,
            &payload(json!({"cep": "01001000", "subtotal": 10})),
            None,
        )
        .await
        .unwrap();

    assert_eq!(result.provider_code.as_deref(), Some("ZONE"));
    assert_eq!(
        result.attempts[0].outcome,
        AttemptOutcome::DriverNotFound {
            driver_key: "shipping.retired".to_string()
        }
    );
    assert_eq!(engine.metrics().skipped, 1);
}

#[tokio::test]
async fn broken_rule_does_not_crash_resolution() {
    let engine = TestEngine::new(
        InMemoryCatalog::new()
            .with_provider(shipping_provider("ZONE", 1, "shipping.zone"))
            .with_rule(ServiceRoutingRule::new(ServiceType::Shipping, "ZONE", "not json").with_priority(1))
            .with_rule(ServiceRoutingRule::new(ServiceType::Shipping, "ZONE", r#"{"expression":"orderTotal >"}"#).with_priority(2))
            .with_config(ProviderConfigRecord::new("ZONE", ENV, r#"{"rate": 9}"#)),
    )
    .build()
    .await;

    let result = engine
        .resolve_and_execute(
            ServiceType::Shipping,
            &payload(json!({"cep": "01001000", "subtotal": 10})),
            None,
        )
        .await
        .unwrap();

    assert!(!result.success);
    match &result.attempts[0].outcome {
        AttemptOutcome::Ineligible { reasons } => {
            let reasons: Vec<&str> = reasons.iter().map(|r| r.as_str()).collect();
            assert_eq!(reasons, vec!["invalid_match_json", "spel_error"]);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn driver_of_another_service_type_is_skipped() {
    let payment_only = ScriptedDriver::new(
        "payment.only",
        ServiceType::Payment,
        Script::Respond(payload(json!({"status": "sent"}))),
    );
    let engine = TestEngine::new(InMemoryCatalog::new().with_provider(
        atelie_core::ServiceProvider::new(ServiceType::Notification, "MISWIRED", "payment.only"),
    ))
    .with_driver(payment_only)
    .build()
    .await;

    let result = engine
        .resolve_and_execute(ServiceType::Notification, &payload(json!({"event": "order.paid"})), None)
        .await
        .unwrap();

    assert!(!result.success);
    assert!(matches!(
        result.attempts[0].outcome,
        AttemptOutcome::UnsupportedServiceType { .. }
    ));
}
