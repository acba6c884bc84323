//! Error types for Atelie Core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Unknown service type: {0}")]
    UnknownServiceType(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
