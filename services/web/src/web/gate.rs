//! services/web/src/web/gate.rs
//!
//! The route gate middleware. Runs in front of every route, checks only
//! whether a session cookie is present, and either lets the request through or
//! redirects it.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use nodo_core::gate::GateDecision;
use std::sync::Arc;
use tracing::debug;

use crate::web::session::{self, TokenContext};
use crate::web::state::AppState;

/// Middleware that applies the route table to the incoming path.
///
/// Passing requests go to the next service untouched. Redirects are
/// temporary (307) so the browser repeats the original method.
pub async fn route_gate(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_owned();
    let has_token = session::token(TokenContext::Edge(&jar)).is_some();

    match state.routes.evaluate(&path, has_token) {
        GateDecision::Pass => next.run(req).await,
        GateDecision::Redirect(target) => {
            debug!(%path, %target, has_token, "Route gate redirect");
            Redirect::temporary(&target).into_response()
        }
    }
}
