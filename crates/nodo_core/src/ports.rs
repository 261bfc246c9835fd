//! crates/nodo_core/src/ports.rs
//!
//! Defines the service contracts (traits) the core relies on.
//! These traits form the boundary of the hexagonal architecture, so the core
//! stays independent of the HTTP client and of where tokens are persisted.

use crate::domain::{SessionToken, User};
use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., the backend API).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetches the user a bearer token belongs to.
    ///
    /// A token the backend rejects yields `PortError::Unauthorized`.
    async fn current_user(&self, token: &SessionToken) -> PortResult<User>;
}

/// A durable key/value store holding the page-side copy of the session token.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}
