//! crates/nodo_core/src/session.rs
//!
//! The session context: the current user for each live session token.
//!
//! A user is fetched once when a session starts and then served from memory
//! until the session ends (logout, the backend rejecting the token, or the
//! entry outliving the session lifetime). The context is an injected service;
//! nothing here is global.

use crate::domain::{SessionToken, User};
use crate::ports::{PortResult, UserDirectory};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Matches the default lifetime of the session cookie.
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 30;

#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub user: User,
    pub started_at: DateTime<Utc>,
}

impl SessionEntry {
    fn expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.started_at >= ttl
    }
}

#[derive(Clone)]
pub struct SessionContext {
    directory: Arc<dyn UserDirectory>,
    entries: Arc<RwLock<HashMap<SessionToken, SessionEntry>>>,
    ttl: Duration,
}

impl SessionContext {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self::with_ttl(directory, Duration::days(DEFAULT_SESSION_TTL_DAYS))
    }

    /// A context whose entries are dropped once they are `ttl` old.
    pub fn with_ttl(directory: Arc<dyn UserDirectory>, ttl: Duration) -> Self {
        Self {
            directory,
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Starts (or restarts) a session: fetches the user behind `token` and
    /// caches it. A rejected token leaves no entry behind. Expired entries of
    /// other sessions are swept on the way.
    pub async fn start(&self, token: &SessionToken) -> PortResult<User> {
        let user = match self.directory.current_user(token).await {
            Ok(user) => user,
            Err(e) => {
                self.entries.write().await.remove(token);
                return Err(e);
            }
        };

        info!(user_id = user.id, role = %user.role, "Session started");
        let now = Utc::now();
        let entry = SessionEntry {
            user: user.clone(),
            started_at: now,
        };

        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.expired(self.ttl, now));
        if entries.len() < before {
            debug!(evicted = before - entries.len(), "Swept expired sessions");
        }
        entries.insert(token.clone(), entry);
        Ok(user)
    }

    /// The cached user for `token`, without touching the backend. An expired
    /// entry is evicted and reported as absent.
    pub async fn current(&self, token: &SessionToken) -> Option<User> {
        let now = Utc::now();
        {
            let entries = self.entries.read().await;
            match entries.get(token) {
                Some(entry) if !entry.expired(self.ttl, now) => return Some(entry.user.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        let mut entries = self.entries.write().await;
        // Another task may have restarted the session in between.
        if entries
            .get(token)
            .is_some_and(|entry| entry.expired(self.ttl, now))
        {
            if let Some(entry) = entries.remove(token) {
                info!(user_id = entry.user.id, "Session expired");
            }
        }
        None
    }

    /// The cached user, or a freshly started session if there is none yet.
    pub async fn resolve(&self, token: &SessionToken) -> PortResult<User> {
        if let Some(user) = self.current(token).await {
            debug!(user_id = user.id, "Serving cached session user");
            return Ok(user);
        }
        self.start(token).await
    }

    /// Ends the session and hands back what it held, if anything.
    pub async fn end(&self, token: &SessionToken) -> Option<SessionEntry> {
        let removed = self.entries.write().await.remove(token);
        if let Some(entry) = &removed {
            info!(user_id = entry.user.id, "Session ended");
        }
        removed
    }

    pub async fn active(&self) -> usize {
        self.entries.read().await.len()
    }
}
