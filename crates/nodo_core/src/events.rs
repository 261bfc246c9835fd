//! crates/nodo_core/src/events.rs
//!
//! Publish/subscribe channel for session-token changes. Any number of
//! subscribers may listen; delivery order between subscribers is not defined.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

/// Default number of events a slow subscriber may fall behind before it
/// starts skipping.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// A change to a session token. Events never carry the token itself, and
/// the user id is always one the backend vouched for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TokenEvent {
    Set { user_id: u64 },
    Cleared { user_id: u64 },
}

impl TokenEvent {
    pub fn user_id(&self) -> u64 {
        match self {
            TokenEvent::Set { user_id } | TokenEvent::Cleared { user_id } => *user_id,
        }
    }
}

#[derive(Clone)]
pub struct TokenEvents {
    sender: broadcast::Sender<TokenEvent>,
}

impl Default for TokenEvents {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl TokenEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event and returns how many subscribers received it.
    /// Publishing with nobody listening is not an error.
    pub fn publish(&self, event: TokenEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                debug!(?event, "Token event published with no subscribers");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TokenEvent> {
        self.sender.subscribe()
    }
}
