//! Runtime error types

use atelie_repository::RepositoryError;
use thiserror::Error;

/// Runtime error
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A required configuration key is absent or blank
    #[error("Missing required config: {key}")]
    MissingConfig { key: String },

    /// A configuration key is present but cannot be read as the requested type
    #[error("Invalid config value for '{key}': {message}")]
    InvalidConfig { key: String, message: String },

    /// Type error
    #[error("Type error: {0}")]
    TypeError(String),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid regex '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },

    /// Two drivers registered under the same key
    #[error("Driver already registered: {0}")]
    DuplicateDriver(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Persistence failure while loading configuration
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl RuntimeError {
    pub fn missing_config(key: impl Into<String>) -> Self {
        RuntimeError::MissingConfig { key: key.into() }
    }

    pub fn invalid_config(key: impl Into<String>, message: impl Into<String>) -> Self {
        RuntimeError::InvalidConfig {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;
