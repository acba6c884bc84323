//! Integration tests for FileSystemCatalog

use atelie_core::ServiceType;
use atelie_repository::{
    FileSystemCatalog, ProviderConfigGateway, ProviderGateway, RepositoryError, RoutingRuleGateway,
    SystemConfigGateway,
};
use std::path::PathBuf;
use tempfile::TempDir;
use tokio::fs;

const CATALOG: &str = r#"
providers:
  - service_type: SHIPPING
    code: J3
    name: J3 Transportes
    driver_key: shipping.j3
    priority: 1
  - service_type: SHIPPING
    code: CORREIOS
    driver_key: generic.webhook
    priority: 2
  - service_type: SHIPPING
    code: LEGACY
    driver_key: generic.webhook
    priority: 0
    enabled: false
  - service_type: PAYMENT
    code: MERCADO_PAGO
    driver_key: generic.webhook
rules:
  - service_type: SHIPPING
    provider_code: J3
    priority: 1
    match:
      cep_prefix: ["010", "011"]
    behavior:
      badge: express
  - service_type: SHIPPING
    provider_code: CORREIOS
    match: '{"expression":"orderTotal >= 50"}'
provider_configs:
  - provider_code: J3
    environment: production
    version: 1
    config: { rate: 15.0, free_threshold: 299.0 }
  - provider_code: J3
    environment: production
    version: 2
    config: { rate: 17.5, free_threshold: 299.0 }
settings:
  FLAT_RATE: 29.9
  FLAT_FREE_SHIPPING_THRESHOLD: 399
"#;

async fn write_catalog(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("catalog.yaml");
    fs::write(&path, content).await.unwrap();
    (temp_dir, path)
}

#[tokio::test]
async fn test_open_and_list_providers() {
    let (_dir, path) = write_catalog(CATALOG).await;
    let catalog = FileSystemCatalog::open(&path).await.unwrap();

    let providers = ProviderGateway::find_enabled_by_type_ordered(&catalog, ServiceType::Shipping)
        .await
        .unwrap();
    let codes: Vec<_> = providers.iter().map(|p| p.code.as_str()).collect();

    assert_eq!(codes, vec!["J3", "CORREIOS"]);
    assert_eq!(providers[0].name, "J3 Transportes");
}

#[tokio::test]
async fn test_rules_are_normalized_to_json_text() {
    let (_dir, path) = write_catalog(CATALOG).await;
    let catalog = FileSystemCatalog::open(&path).await.unwrap();

    let rules = catalog
        .find_enabled_for_provider(ServiceType::Shipping, "J3")
        .await
        .unwrap();

    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].match_json, r#"{"cep_prefix":["010","011"]}"#);
    assert_eq!(rules[0].behavior_json.as_deref(), Some(r#"{"badge":"express"}"#));
}

#[tokio::test]
async fn test_latest_config_version_and_settings() {
    let (_dir, path) = write_catalog(CATALOG).await;
    let catalog = FileSystemCatalog::open(&path).await.unwrap();

    let config = catalog.find_config_json("J3", "production").await.unwrap().unwrap();
    let config: serde_json::Value = serde_json::from_str(&config).unwrap();
    assert_eq!(config["rate"], 17.5);

    let settings = catalog.load_all().await.unwrap();
    assert!(settings.iter().any(|e| e.key == "FLAT_RATE" && e.value == "29.9"));
    assert!(settings
        .iter()
        .any(|e| e.key == "FLAT_FREE_SHIPPING_THRESHOLD" && e.value == "399"));
}

#[tokio::test]
async fn test_refresh_picks_up_file_changes() {
    let (_dir, path) = write_catalog(CATALOG).await;
    let catalog = FileSystemCatalog::open(&path).await.unwrap();

    let edited = CATALOG.replace("priority: 2", "priority: 0");
    fs::write(&path, edited).await.unwrap();
    catalog.refresh().await.unwrap();

    let providers = ProviderGateway::find_enabled_by_type_ordered(&catalog, ServiceType::Shipping)
        .await
        .unwrap();
    assert_eq!(providers[0].code, "CORREIOS");
}

#[tokio::test]
async fn test_failed_reload_keeps_previous_content() {
    let (_dir, path) = write_catalog(CATALOG).await;
    let catalog = FileSystemCatalog::open(&path).await.unwrap();

    fs::write(&path, "providers: [oops").await.unwrap();
    assert!(catalog.reload().await.is_err());

    let providers = ProviderGateway::find_enabled_by_type_ordered(&catalog, ServiceType::Payment)
        .await
        .unwrap();
    assert_eq!(providers.len(), 1);
}

#[tokio::test]
async fn test_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let err = FileSystemCatalog::open(temp_dir.path().join("absent.yaml"))
        .await
        .unwrap_err();

    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[tokio::test]
async fn test_json_catalog() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("catalog.json");
    fs::write(
        &path,
        r#"{"providers":[{"service_type":"NOTIFICATION","code":"SLACK","driver_key":"notification.webhook"}]}"#,
    )
    .await
    .unwrap();

    let catalog = FileSystemCatalog::open(&path).await.unwrap();
    let provider = catalog
        .find_by_code(ServiceType::Notification, "SLACK")
        .await
        .unwrap();
    assert!(provider.is_some());
}
