//! Unit tests for RepositoryError types and error handling

use atelie_repository::RepositoryError;

#[test]
fn test_error_not_found_display() {
    let error = RepositoryError::NotFound {
        path: "config/catalog.yaml".to_string(),
    };

    assert_eq!(error.to_string(), "Catalog not found: config/catalog.yaml");
}

#[test]
fn test_error_provider_not_found_display() {
    let error = RepositoryError::ProviderNotFound {
        code: "J3".to_string(),
    };

    assert_eq!(error.to_string(), "Provider not found: J3");
}

#[test]
fn test_error_invalid_catalog_display() {
    let error = RepositoryError::InvalidCatalog("duplicate provider code 'J3'".to_string());

    assert_eq!(
        error.to_string(),
        "Invalid catalog: duplicate provider code 'J3'"
    );
}

#[test]
fn test_error_from_io() {
    let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let error: RepositoryError = io_error.into();

    assert!(matches!(error, RepositoryError::Io(_)));
    assert!(error.to_string().starts_with("I/O error:"));
}

#[test]
fn test_error_from_yaml() {
    let yaml_error = serde_yaml::from_str::<Vec<String>>("{not: [a list").unwrap_err();
    let error: RepositoryError = yaml_error.into();

    assert!(error.to_string().starts_with("Failed to parse YAML:"));
}

#[test]
fn test_error_from_json() {
    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let error: RepositoryError = json_error.into();

    assert!(error.to_string().starts_with("Failed to parse JSON:"));
}
