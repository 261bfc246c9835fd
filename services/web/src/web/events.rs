//! services/web/src/web/events.rs
//!
//! Server-sent event stream of token changes. Every open tab of the same user
//! subscribes here and re-reads its session when an event arrives.

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use axum_extra::extract::cookie::CookieJar;
use futures::Stream;
use nodo_core::ports::PortError;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, warn};

use crate::web::session::{self, TokenContext};
use crate::web::state::AppState;

/// GET /session/events - Stream of token changes for the caller's user
///
/// Requires a valid session. Only events for the user behind the session
/// token are forwarded.
#[utoipa::path(
    get,
    path = "/session/events",
    responses(
        (status = 200, description = "text/event-stream of `token` events"),
        (status = 401, description = "No valid session"),
        (status = 502, description = "The backend could not be reached")
    )
)]
pub async fn token_events_handler(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, String)> {
    let unauthorized = || (StatusCode::UNAUTHORIZED, "A valid session is required".to_string());

    let token = session::token(TokenContext::Edge(&jar)).ok_or_else(unauthorized)?;
    let user = state.sessions.resolve(&token).await.map_err(|e| match e {
        PortError::Unauthorized => unauthorized(),
        e => {
            error!(error = %e, "Failed to load the current user");
            (StatusCode::BAD_GATEWAY, "Failed to load the current user".to_string())
        }
    })?;
    if user.blocked {
        return Err(unauthorized());
    }

    let subscriber = user.id;
    let mut receiver = state.accessor.events().subscribe();
    let shutdown = state.shutdown.clone();

    let stream = async_stream::stream! {
        loop {
            let received = tokio::select! {
                _ = shutdown.cancelled() => break,
                received = receiver.recv() => received,
            };

            match received {
                Ok(event) => {
                    if event.user_id() != subscriber {
                        continue;
                    }
                    match Event::default().event("token").json_data(&event) {
                        Ok(sse_event) => yield Ok(sse_event),
                        Err(e) => warn!(error = %e, "Failed to encode token event"),
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Token event subscriber lagged behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!(subscriber, "Token event stream closed");
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
