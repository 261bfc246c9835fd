//! crates/nodo_core/src/gate.rs
//!
//! The route gate's decision logic. Given a request path and whether a session
//! token is present, decide whether the navigation passes or is redirected.
//!
//! The gate only ever looks at token *presence*. Whether the token is valid,
//! and what role it carries, is checked by the page layer.

use crate::domain::{Brand, BYNODO_PREFIX};
use crate::roles::LOGIN_PATH;
use serde::Serialize;
use std::str::FromStr;

/// Where a user who already holds a session is sent when they open an
/// auth-only page.
pub const AUTHENTICATED_LANDING: &str = "/dashboard/mis-cursos";

/// Query parameter carrying the originally requested path to the login page.
pub const FROM_PARAM: &str = "from";

const BYPASS_PREFIXES: [&str; 2] = ["/_next", "/api"];
const AUTH_ONLY_PAGES: [&str; 2] = ["/login", "/registro"];
const PROTECTED_PAGES: [&str; 3] = [
    "/dashboard/mi-perfil",
    "/dashboard/mis-cursos",
    "/dashboard/mis-pagos",
];
const PROTECTED_PREFIXES: [&str; 2] = ["/dashboard", "/admin"];

//=========================================================================================
// Classification
//=========================================================================================

/// The class a path falls into. Derived from the path alone, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteClass {
    /// Framework-internal, API and static asset traffic. Never checked.
    Bypass,
    /// Login and registration.
    AuthOnly,
    Protected,
    Open,
}

/// How the protected set is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtectionPolicy {
    /// Only the enumerated pages are protected; everything else is open.
    #[default]
    Exact,
    /// Enumerated pages plus everything below the protected prefixes.
    Prefix,
}

impl FromStr for ProtectionPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(ProtectionPolicy::Exact),
            "prefix" => Ok(ProtectionPolicy::Prefix),
            other => Err(format!("'{}' is not a protection policy (exact|prefix)", other)),
        }
    }
}

/// The outcome of a gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Pass,
    Redirect(String),
}

/// The route table the gate enforces.
#[derive(Debug, Clone)]
pub struct RouteTable {
    bypass_prefixes: Vec<String>,
    auth_only: Vec<String>,
    protected: Vec<String>,
    protected_prefixes: Vec<String>,
    policy: ProtectionPolicy,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            bypass_prefixes: owned_paths(&BYPASS_PREFIXES),
            auth_only: owned_paths(&AUTH_ONLY_PAGES),
            protected: owned_paths(&PROTECTED_PAGES),
            protected_prefixes: owned_paths(&PROTECTED_PREFIXES),
            policy: ProtectionPolicy::Exact,
        }
    }
}

impl RouteTable {
    pub fn with_policy(policy: ProtectionPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Adds an exact page to the protected set.
    pub fn protect(mut self, path: impl Into<String>) -> Self {
        self.protected.push(path.into());
        self
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        if self
            .bypass_prefixes
            .iter()
            .any(|prefix| under_prefix(path, prefix))
            || path.contains('.')
        {
            return RouteClass::Bypass;
        }

        let path = normalize(unbranded(path));
        if self.auth_only.iter().any(|page| page == path) {
            return RouteClass::AuthOnly;
        }
        if self.protected.iter().any(|page| page == path) {
            return RouteClass::Protected;
        }
        if self.policy == ProtectionPolicy::Prefix
            && self
                .protected_prefixes
                .iter()
                .any(|prefix| under_prefix(path, prefix))
        {
            return RouteClass::Protected;
        }
        RouteClass::Open
    }

    /// Runs the gate for one navigation.
    pub fn evaluate(&self, path: &str, has_token: bool) -> GateDecision {
        match self.classify(path) {
            RouteClass::AuthOnly if has_token => {
                GateDecision::Redirect(branded(path, AUTHENTICATED_LANDING))
            }
            RouteClass::Protected if !has_token => GateDecision::Redirect(login_redirect(path)),
            _ => GateDecision::Pass,
        }
    }
}

/// The login URL that returns the user to `from` afterwards.
pub fn login_redirect(from: &str) -> String {
    format!(
        "{}?{}={}",
        LOGIN_PATH,
        FROM_PARAM,
        urlencoding::encode(from)
    )
}

/// Accepts a post-login return target only if it stays on this site.
///
/// Browsers drop tabs and newlines from URLs, so `/\t/host` would become
/// `//host`; any control character or whitespace rejects the candidate.
pub fn sanitize_return_path(candidate: &str) -> Option<&str> {
    let local = candidate.starts_with('/')
        && !candidate.starts_with("//")
        && !candidate.contains('\\')
        && !candidate
            .chars()
            .any(|c| c.is_control() || c.is_whitespace());
    local.then_some(candidate)
}

fn owned_paths(paths: &[&str]) -> Vec<String> {
    paths.iter().map(|p| p.to_string()).collect()
}

// `/login/` and `/login` are the same page.
fn normalize(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

// The ByNodo tree mirrors the Nodo one below its prefix.
fn unbranded(path: &str) -> &str {
    match path.strip_prefix(BYNODO_PREFIX) {
        Some("") => "/",
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    }
}

fn branded(original: &str, target: &str) -> String {
    match Brand::from_path(original) {
        Brand::ByNodo => format!("{}{}", BYNODO_PREFIX, target),
        Brand::Nodo => target.to_string(),
    }
}

fn under_prefix(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
