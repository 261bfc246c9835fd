pub mod auth;
pub mod events;
pub mod gate;
pub mod pages;
pub mod rest;
pub mod session;
pub mod state;

use axum::{
    http::StatusCode,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use nodo_core::domain::BYNODO_PREFIX;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use gate::route_gate;
pub use rest::ApiDoc;
pub use state::AppState;

/// Builds the gateway router. The route gate wraps every route, including
/// the fallback, so no navigation skips it.
pub fn router(state: Arc<AppState>) -> Router {
    // Served for both brands; ByNodo lives under its path prefix.
    let pages = Router::new()
        .route("/login", get(auth::login_page))
        .route("/registro", get(auth::register_page))
        .route("/dashboard/{page}", get(pages::dashboard_page))
        .route("/admin/{page}", get(pages::admin_page));

    Router::new()
        .route("/health", get(rest::health_handler))
        .route("/session", post(auth::adopt_session_handler))
        .route("/session/events", get(events::token_events_handler))
        .route("/logout", post(auth::logout_handler))
        .merge(pages.clone())
        .nest(BYNODO_PREFIX, pages)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .layer(axum_middleware::from_fn_with_state(state.clone(), route_gate))
        .with_state(state)
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}
