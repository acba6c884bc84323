//! SDK error types

use atelie_repository::RepositoryError;
use atelie_runtime::RuntimeError;
use thiserror::Error;

/// SDK error type
///
/// Ordinary routing failures (bad rules, unreachable providers) are reported
/// inside a `ServiceResult`; only failures the caller cannot route around
/// end up here.
#[derive(Error, Debug)]
pub enum SdkError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Catalog could not be read
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),

    /// Runtime error
    #[error("Runtime error: {0}")]
    RuntimeError(#[from] RuntimeError),

    /// The last-resort shipping provider failed too
    #[error("Contingency provider {provider_code} failed: {message}")]
    ContingencyFailed { provider_code: String, message: String },
}

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let error = SdkError::ConfigError("provider gateway is required".to_string());
        assert!(error.to_string().contains("Configuration error"));
        assert!(error.to_string().contains("provider gateway"));
    }

    #[test]
    fn test_contingency_failed() {
        let error = SdkError::ContingencyFailed {
            provider_code: "FLAT_RATE".to_string(),
            message: "Missing required config: rate".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Contingency provider FLAT_RATE failed: Missing required config: rate"
        );
    }

    #[test]
    fn test_runtime_error_conversion() {
        let sdk_error: SdkError = RuntimeError::missing_config("FLAT_RATE").into();
        assert!(sdk_error.to_string().contains("Runtime error"));
        assert!(sdk_error.to_string().contains("FLAT_RATE"));
    }

    #[test]
    fn test_repository_error_conversion() {
        let sdk_error: SdkError = RepositoryError::NotFound {
            path: "catalog.yaml".to_string(),
        }
        .into();
        assert!(sdk_error.to_string().contains("catalog.yaml"));
    }
}
