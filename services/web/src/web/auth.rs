//! services/web/src/web/auth.rs
//!
//! Endpoints around the session lifecycle: the login and registration page
//! models, the hand-over from the external login flow, and logout.

use axum::{
    extract::{OriginalUri, Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Json, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use nodo_core::domain::{Brand, SessionToken};
use nodo_core::gate::sanitize_return_path;
use nodo_core::ports::PortError;
use nodo_core::roles::{default_route, LOGIN_PATH};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::web::rest::{AdoptSessionRequest, AuthPage, SessionResponse};
use crate::web::session::{self, TokenContext};
use crate::web::state::AppState;

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize)]
pub struct ReturnQuery {
    pub from: Option<String>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /login - Login page model
#[utoipa::path(
    get,
    path = "/login",
    params(("from" = Option<String>, Query, description = "Path to return to after login.")),
    responses(
        (status = 200, description = "Login page model", body = AuthPage),
        (status = 307, description = "Already signed in; redirected to the landing route")
    )
)]
pub async fn login_page(
    Query(query): Query<ReturnQuery>,
    OriginalUri(uri): OriginalUri,
) -> Json<AuthPage> {
    Json(auth_page("login", &uri, query))
}

/// GET /registro - Registration page model
#[utoipa::path(
    get,
    path = "/registro",
    params(("from" = Option<String>, Query, description = "Path to return to after sign-up.")),
    responses(
        (status = 200, description = "Registration page model", body = AuthPage),
        (status = 307, description = "Already signed in; redirected to the landing route")
    )
)]
pub async fn register_page(
    Query(query): Query<ReturnQuery>,
    OriginalUri(uri): OriginalUri,
) -> Json<AuthPage> {
    Json(auth_page("registro", &uri, query))
}

/// POST /session - Adopt a token issued by the external login flow
///
/// Starts the session (the user is fetched once and cached), writes the
/// `token` and `userId` cookies plus the page-side copy, and tells the
/// browser where to go next. The user id always comes from the backend; a
/// `user_id` in the request that names someone else is refused.
#[utoipa::path(
    post,
    path = "/session",
    request_body = AdoptSessionRequest,
    responses(
        (status = 200, description = "Session established", body = SessionResponse),
        (status = 400, description = "Empty token"),
        (status = 401, description = "The backend rejected the token"),
        (status = 403, description = "The user is blocked, or `user_id` does not match the token"),
        (status = 502, description = "The backend could not be reached")
    )
)]
pub async fn adopt_session_handler(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<AdoptSessionRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Validate the hand-over
    let token = SessionToken::new(req.token)
        .ok_or((StatusCode::BAD_REQUEST, "token must not be empty".to_string()))?;

    // 2. Start the session, fetching the user once
    let user = state.sessions.start(&token).await.map_err(|e| match e {
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Invalid session token".to_string()),
        e => {
            error!(error = %e, "Failed to start session");
            (StatusCode::BAD_GATEWAY, "Failed to load the current user".to_string())
        }
    })?;

    if user.blocked {
        warn!(user_id = user.id, "Blocked user tried to start a session");
        state.sessions.end(&token).await;
        return Err((StatusCode::FORBIDDEN, "User is blocked".to_string()));
    }
    if let Some(claimed) = req.user_id.filter(|claimed| *claimed != user.id) {
        warn!(claimed, user_id = user.id, "Session hand-over named a different user");
        state.sessions.end(&token).await;
        return Err((
            StatusCode::FORBIDDEN,
            "user_id does not match the token".to_string(),
        ));
    }
    let user_id = user.id;

    // 3. Retire whatever session this browser held before
    if let Some(previous) = session::token(TokenContext::Edge(&jar)).filter(|p| *p != token) {
        if let Some(entry) = state.sessions.end(&previous).await {
            if entry.user.id != user_id {
                state.accessor.forget(entry.user.id);
            }
        }
    }

    // 4. Write both token copies and announce the change
    let jar = state.accessor.write_session(jar, &token, user_id);

    // 5. Pick the next destination
    let redirect = req
        .from
        .as_deref()
        .and_then(sanitize_return_path)
        .unwrap_or_else(|| default_route(Some(&user.role)))
        .to_string();

    info!(user_id, role = %user.role, %redirect, "Session adopted");
    let response = SessionResponse {
        user_id,
        role: user.role.to_string(),
        redirect,
    };
    Ok((StatusCode::OK, jar, Json(response)))
}

/// POST /logout - End the session and clear both token copies
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 303, description = "Signed out; redirected to login"))
)]
pub async fn logout_handler(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    let ended = match session::token(TokenContext::Edge(&jar)) {
        Some(token) => state.sessions.end(&token).await,
        None => None,
    };
    let user_id = ended.map(|entry| entry.user.id);
    info!(?user_id, "Signed out");

    let jar = state.accessor.clear_session(jar, user_id);
    (jar, Redirect::to(LOGIN_PATH))
}

fn auth_page(page: &str, uri: &Uri, query: ReturnQuery) -> AuthPage {
    AuthPage {
        page: page.to_string(),
        brand: Brand::from_path(uri.path()).as_str().to_string(),
        from: query
            .from
            .as_deref()
            .and_then(sanitize_return_path)
            .map(str::to_string),
    }
}
