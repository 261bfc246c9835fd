//! services/web/src/error.rs
//!
//! Defines the primary error type for the gateway service.

use crate::config::ConfigError;

/// The primary error type for the `web` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error from the HTTP client used to reach the backend.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
