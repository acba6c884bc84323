//! Error types for the repository layer

use thiserror::Error;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors that can occur while reading catalogs
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Catalog source not found at the specified path
    #[error("Catalog not found: {path}")]
    NotFound { path: String },

    /// Record addressed by code does not exist
    #[error("Provider not found: {code}")]
    ProviderNotFound { code: String },

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Catalog content is structurally wrong (duplicates, bad references)
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// Database error (when database feature is enabled)
    #[cfg(feature = "postgres")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored value could not be decoded
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Generic error
    #[error("Repository error: {0}")]
    Other(String),
}
