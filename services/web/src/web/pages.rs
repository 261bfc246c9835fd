//! services/web/src/web/pages.rs
//!
//! Page handlers for the authenticated area. The route gate has already run;
//! here the token is resolved to a user and role-based authorization is
//! applied.

use axum::{
    extract::{OriginalUri, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use nodo_core::domain::User;
use nodo_core::gate::login_redirect;
use nodo_core::ports::PortError;
use nodo_core::roles::{default_route, is_admin_like};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::web::rest::PageModel;
use crate::web::session::{self, TokenContext};
use crate::web::state::AppState;

/// GET /dashboard/{page} - Page model for the client area
#[utoipa::path(
    get,
    path = "/dashboard/{page}",
    params(("page" = String, Path, description = "Dashboard page slug, e.g. `mis-cursos`.")),
    responses(
        (status = 200, description = "Page model", body = PageModel),
        (status = 307, description = "No valid session; redirected to login"),
        (status = 502, description = "The backend could not be reached")
    )
)]
pub async fn dashboard_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(page): Path<String>,
    OriginalUri(uri): OriginalUri,
) -> Response {
    match authenticate(&state, jar, uri.path()).await {
        Ok((user, jar)) => (jar, Json(PageModel::new(&page, uri.path(), &user))).into_response(),
        Err(response) => response,
    }
}

/// GET /admin/{page} - Page model for the admin area
///
/// Only admin-like roles get through; everyone else is sent to their own
/// landing route.
#[utoipa::path(
    get,
    path = "/admin/{page}",
    params(("page" = String, Path, description = "Admin page slug, e.g. `proyectos`.")),
    responses(
        (status = 200, description = "Page model", body = PageModel),
        (status = 307, description = "No valid session, or a role without admin access"),
        (status = 502, description = "The backend could not be reached")
    )
)]
pub async fn admin_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(page): Path<String>,
    OriginalUri(uri): OriginalUri,
) -> Response {
    let (user, jar) = match authenticate(&state, jar, uri.path()).await {
        Ok(authenticated) => authenticated,
        Err(response) => return response,
    };

    if !is_admin_like(Some(&user.role)) {
        let target = default_route(Some(&user.role));
        warn!(user_id = user.id, role = %user.role, path = uri.path(), "Admin page denied");
        return (jar, Redirect::temporary(target)).into_response();
    }

    (jar, Json(PageModel::new(&page, uri.path(), &user))).into_response()
}

/// Resolves the session behind the request to a user, or produces the
/// response that sends the browser to login.
///
/// The page store is reconciled only after the backend has named the user, so
/// a request can never touch another user's slot.
async fn authenticate(
    state: &AppState,
    jar: CookieJar,
    path: &str,
) -> Result<(User, CookieJar), Response> {
    let Some(token) = session::token(TokenContext::Edge(&jar)) else {
        debug!(path, "Page requested without a session");
        return Err(Redirect::temporary(&login_redirect(path)).into_response());
    };

    match state.sessions.resolve(&token).await {
        Ok(user) if user.blocked => {
            warn!(user_id = user.id, "Blocked user tried to open a page");
            state.sessions.end(&token).await;
            Err(sign_out(state, jar, path, Some(user.id)))
        }
        Ok(user) => {
            state.accessor.reconcile(&token, user.id);
            let jar = state.accessor.pin_user_id(jar, user.id);
            Ok((user, jar))
        }
        Err(PortError::Unauthorized) => {
            // No user behind the token, so no page slot to clear.
            warn!(path, "Session token rejected by the backend");
            Err(sign_out(state, jar, path, None))
        }
        Err(e) => {
            error!(error = %e, path, "Failed to load the current user");
            let body = "Failed to load the current user".to_string();
            Err((StatusCode::BAD_GATEWAY, body).into_response())
        }
    }
}

fn sign_out(state: &AppState, jar: CookieJar, path: &str, user_id: Option<u64>) -> Response {
    let jar = state.accessor.clear_session(jar, user_id);
    (jar, Redirect::temporary(&login_redirect(path))).into_response()
}
