//! crates/nodo_core/src/roles.rs
//!
//! The role registry: maps the backend's role identifiers onto the categories
//! the gateway reasons about, and each category onto a landing route.
//!
//! Every function here is total. An absent or unrecognised role is not an
//! error; it simply falls into the least-privileged bucket.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_PROJECT_MANAGER: &str = "gerente_de_proyecto";
pub const ROLE_AUTHENTICATED: &str = "authenticated";
pub const ROLE_CLIENT: &str = "client";
pub const ROLE_PUBLIC: &str = "public";

/// Landing route for admin-like roles.
pub const ADMIN_HOME: &str = "/admin/proyectos";
/// Landing route for client-like roles.
pub const CLIENT_HOME: &str = "/dashboard/cursos";
pub const LOGIN_PATH: &str = "/login";

/// A role attached to a user record.
///
/// `Authenticated` and `Client` stay distinct values even though both fall
/// into [`RoleCategory::ClientLike`]; callers must go through the category
/// rather than compare the two.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    ProjectManager,
    Authenticated,
    Client,
    Public,
    Unknown(String),
}

impl Role {
    /// Parses a backend role identifier. Matching ignores case and
    /// surrounding whitespace; anything else is kept verbatim as `Unknown`.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            ROLE_ADMIN => Role::Admin,
            ROLE_PROJECT_MANAGER => Role::ProjectManager,
            ROLE_AUTHENTICATED => Role::Authenticated,
            ROLE_CLIENT => Role::Client,
            ROLE_PUBLIC => Role::Public,
            _ => Role::Unknown(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => ROLE_ADMIN,
            Role::ProjectManager => ROLE_PROJECT_MANAGER,
            Role::Authenticated => ROLE_AUTHENTICATED,
            Role::Client => ROLE_CLIENT,
            Role::Public => ROLE_PUBLIC,
            Role::Unknown(raw) => raw,
        }
    }

    pub fn category(&self) -> RoleCategory {
        match self {
            Role::Admin | Role::ProjectManager => RoleCategory::AdminLike,
            Role::Authenticated | Role::Client => RoleCategory::ClientLike,
            Role::Public | Role::Unknown(_) => RoleCategory::Anonymous,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Role::parse(&raw))
    }
}

/// The semantic buckets roles fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleCategory {
    AdminLike,
    /// Equivalence class of `authenticated` and `client`.
    ClientLike,
    Anonymous,
}

pub fn category(role: Option<&Role>) -> RoleCategory {
    role.map(Role::category).unwrap_or(RoleCategory::Anonymous)
}

pub fn is_admin_like(role: Option<&Role>) -> bool {
    category(role) == RoleCategory::AdminLike
}

pub fn is_client_like(role: Option<&Role>) -> bool {
    category(role) == RoleCategory::ClientLike
}

/// Where a user with this role lands after logging in.
pub fn default_route(role: Option<&Role>) -> &'static str {
    match category(role) {
        RoleCategory::AdminLike => ADMIN_HOME,
        RoleCategory::ClientLike => CLIENT_HOME,
        RoleCategory::Anonymous => LOGIN_PATH,
    }
}
