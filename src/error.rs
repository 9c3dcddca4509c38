//! Error types and handling.

use thiserror::Error;

use crate::config::ConfigError;

/// Application-wide error type.
///
/// Only construction and configuration problems surface here. Failures while
/// talking to a camera are reported as a [`ResultCode`](crate::cgi::ResultCode)
/// inside a [`CommandResult`](crate::cgi::CommandResult), never as an `AppError`.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP client could not be built
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint fields rejected at construction
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Camera identifier not present in the registry
    #[error("Unknown camera: {0}")]
    UnknownCamera(String),
}

/// Result type alias for AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Create an invalid endpoint error with message
    pub fn invalid_endpoint(msg: impl Into<String>) -> Self {
        Self::InvalidEndpoint(msg.into())
    }

    /// Create an unknown camera error
    pub fn unknown_camera(name: impl Into<String>) -> Self {
        Self::UnknownCamera(name.into())
    }
}
