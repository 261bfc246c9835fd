//! services/web/src/web/state.rs
//!
//! Defines the gateway's shared state.

use crate::config::Config;
use crate::web::session::{CookieSettings, SessionAccessor};
use chrono::Duration;
use nodo_core::events::TokenEvents;
use nodo_core::gate::RouteTable;
use nodo_core::ports::{TokenStore, UserDirectory};
use nodo_core::session::SessionContext;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub sessions: SessionContext,
    pub accessor: SessionAccessor,
    /// Cancelled on shutdown so long-lived streams can finish.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        config: &Config,
        directory: Arc<dyn UserDirectory>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        let routes = Arc::new(RouteTable::with_policy(config.protection_policy));
        let cookies = CookieSettings {
            secure: config.cookie_secure,
            max_age_days: config.cookie_max_age_days,
        };
        let events = TokenEvents::new(config.event_capacity);
        // A cached user never outlives the cookie that carries its token.
        let ttl = Duration::days(config.cookie_max_age_days);

        Self {
            routes,
            sessions: SessionContext::with_ttl(directory, ttl),
            accessor: SessionAccessor::new(store, events, cookies),
            shutdown: CancellationToken::new(),
        }
    }
}
