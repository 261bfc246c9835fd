//! crates/nodo_core/src/domain.rs
//!
//! Defines the pure, core data structures for the gateway.
//! These structs are independent of any HTTP framework or wire format.

use crate::roles::Role;
use serde::Serialize;
use std::fmt;

/// An opaque bearer credential issued by the backend's login flow.
///
/// Empty or whitespace-only values are never a token, so construction goes
/// through [`SessionToken::new`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The value of an `Authorization` header carrying this token.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

// Tokens end up in log fields; never print the credential itself.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// The authenticated user, as returned by the backend for a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub confirmed: bool,
    pub blocked: bool,
}

impl User {
    /// Name to show in navigation chrome; falls back to the username.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.username)
    }
}

/// The two branded experiences served from the same route tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Brand {
    Nodo,
    ByNodo,
}

/// Path prefix under which the ByNodo experience lives.
pub const BYNODO_PREFIX: &str = "/bynodo";

impl Brand {
    /// Picks the brand from the request path alone.
    pub fn from_path(path: &str) -> Self {
        let under_prefix = path == BYNODO_PREFIX
            || path
                .strip_prefix(BYNODO_PREFIX)
                .is_some_and(|rest| rest.starts_with('/'));
        if under_prefix {
            Brand::ByNodo
        } else {
            Brand::Nodo
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Brand::Nodo => "nodo",
            Brand::ByNodo => "bynodo",
        }
    }
}
