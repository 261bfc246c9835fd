//! services/web/src/adapters/backend.rs
//!
//! This module contains the backend adapter, the concrete implementation of the
//! `UserDirectory` port from the `core` crate. It talks to the platform's JSON
//! API over HTTP using `reqwest`.

use crate::web::session::auth_headers;
use async_trait::async_trait;
use nodo_core::domain::{SessionToken, User};
use nodo_core::ports::{PortError, PortResult, UserDirectory};
use nodo_core::roles::Role;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `UserDirectory` port against the backend API.
#[derive(Clone)]
pub struct BackendAdapter {
    client: Client,
    base_url: String,
}

impl BackendAdapter {
    /// Creates a new `BackendAdapter`. `base_url` must not end with a slash.
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("nodo-web/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn current_user_url(&self) -> String {
        format!("{}/users/me?populate=role", self.base_url)
    }
}

//=========================================================================================
// Backend Payload Structs
//=========================================================================================

#[derive(Deserialize)]
struct UserRecord {
    id: u64,
    username: String,
    email: String,
    #[serde(default, alias = "displayName", alias = "nombre")]
    display_name: Option<String>,
    #[serde(default)]
    confirmed: bool,
    #[serde(default)]
    blocked: bool,
    #[serde(default)]
    role: Option<RoleRecord>,
}

#[derive(Deserialize)]
struct RoleRecord {
    #[serde(rename = "type")]
    kind: String,
}

impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            display_name: self.display_name,
            // A user record without a role is an anonymous one.
            role: self
                .role
                .map(|role| Role::parse(&role.kind))
                .unwrap_or(Role::Public),
            confirmed: self.confirmed,
            blocked: self.blocked,
        }
    }
}

//=========================================================================================
// `UserDirectory` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserDirectory for BackendAdapter {
    async fn current_user(&self, token: &SessionToken) -> PortResult<User> {
        let response = self
            .client
            .get(self.current_user_url())
            .headers(auth_headers(Some(token), None))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!(%status, "Backend rejected the session token");
                return Err(PortError::Unauthorized);
            }
            StatusCode::NOT_FOUND => {
                return Err(PortError::NotFound("current user".to_string()));
            }
            _ if !status.is_success() => {
                return Err(PortError::Unexpected(format!(
                    "backend answered {} for the current user",
                    status
                )));
            }
            _ => {}
        }

        let record: UserRecord = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        debug!(user_id = record.id, "Fetched current user from backend");
        Ok(record.to_domain())
    }
}
