//! Shared fixtures for the gateway integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use http_body_util::BodyExt;
use nodo_core::domain::{SessionToken, User};
use nodo_core::gate::ProtectionPolicy;
use nodo_core::ports::{PortError, PortResult, UserDirectory};
use nodo_core::roles::Role;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;
use tracing::Level;
use web_lib::adapters::MemoryTokenStore;
use web_lib::config::Config;
use web_lib::web::{router, AppState};

/// A `UserDirectory` that knows a fixed set of tokens.
#[derive(Default)]
pub struct FakeDirectory {
    users: HashMap<String, User>,
    pub calls: AtomicUsize,
    pub unreachable: bool,
}

impl FakeDirectory {
    /// A directory whose backend cannot be reached.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn with_user(mut self, token: &str, user: User) -> Self {
        self.users.insert(token.to_string(), user);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserDirectory for FakeDirectory {
    async fn current_user(&self, token: &SessionToken) -> PortResult<User> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(PortError::Unexpected("connection refused".to_string()));
        }
        self.users
            .get(token.as_str())
            .cloned()
            .ok_or(PortError::Unauthorized)
    }
}

pub fn user(id: u64, role: Role) -> User {
    User {
        id,
        username: format!("user{}", id),
        email: format!("user{}@nodo.test", id),
        display_name: None,
        role,
        confirmed: true,
        blocked: false,
    }
}

pub fn config(policy: ProtectionPolicy) -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        backend_url: "http://backend.test".to_string(),
        log_level: Level::DEBUG,
        protection_policy: policy,
        cookie_secure: false,
        cookie_max_age_days: 30,
        event_capacity: 16,
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub directory: Arc<FakeDirectory>,
    pub store: Arc<MemoryTokenStore>,
}

pub fn spawn_app(directory: FakeDirectory) -> TestApp {
    spawn_app_with_policy(directory, ProtectionPolicy::Exact)
}

pub fn spawn_app_with_policy(directory: FakeDirectory, policy: ProtectionPolicy) -> TestApp {
    let directory = Arc::new(directory);
    let store = Arc::new(MemoryTokenStore::default());
    let state = Arc::new(AppState::new(
        &config(policy),
        directory.clone(),
        store.clone(),
    ));
    TestApp {
        router: router(state.clone()),
        state,
        directory,
        store,
    }
}

impl TestApp {
    pub async fn get(&self, uri: &str, cookies: Option<&str>) -> Response<Body> {
        let mut request = Request::builder().method("GET").uri(uri);
        if let Some(cookies) = cookies {
            request = request.header(header::COOKIE, cookies);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(
        &self,
        uri: &str,
        cookies: Option<&str>,
        body: serde_json::Value,
    ) -> Response<Body> {
        let mut request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookies) = cookies {
            request = request.header(header::COOKIE, cookies);
        }
        self.send(request.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

pub async fn json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
