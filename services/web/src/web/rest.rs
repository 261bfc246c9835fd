//! services/web/src/web/rest.rs
//!
//! The JSON payloads the gateway answers with, the health handler, and the
//! master definition for the OpenAPI specification.

use axum::{http::StatusCode, response::IntoResponse};
use nodo_core::domain::{Brand, User};
use nodo_core::menu::{resolve_menu, MenuEntry};
use nodo_core::roles::default_route;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        crate::web::auth::login_page,
        crate::web::auth::register_page,
        crate::web::auth::adopt_session_handler,
        crate::web::auth::logout_handler,
        crate::web::pages::dashboard_page,
        crate::web::pages::admin_page,
        crate::web::events::token_events_handler,
    ),
    components(
        schemas(PageModel, UserView, MenuItem, AuthPage, AdoptSessionRequest, SessionResponse)
    ),
    tags(
        (name = "Nodo Gateway", description = "Route gating, session hand-over and page models for Nodo and ByNodo.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The authenticated user as exposed to page code.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserView {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    /// Name to show in the navigation chrome.
    pub label: String,
    pub role: String,
    pub confirmed: bool,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            label: user.label().to_string(),
            role: user.role.to_string(),
            confirmed: user.confirmed,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuItem {
    pub path: String,
    pub icon: String,
    pub label: String,
}

impl From<MenuEntry> for MenuItem {
    fn from(entry: MenuEntry) -> Self {
        Self {
            path: entry.path.to_string(),
            icon: entry.icon.to_string(),
            label: entry.label.to_string(),
        }
    }
}

/// Everything an authenticated page needs besides its own data.
#[derive(Debug, Serialize, ToSchema)]
pub struct PageModel {
    pub page: String,
    pub brand: String,
    /// The user's default landing route.
    pub home: String,
    pub user: UserView,
    pub menu: Vec<MenuItem>,
}

impl PageModel {
    pub fn new(page: &str, path: &str, user: &User) -> Self {
        Self {
            page: page.to_string(),
            brand: Brand::from_path(path).as_str().to_string(),
            home: default_route(Some(&user.role)).to_string(),
            user: UserView::from(user),
            menu: resolve_menu(Some(&user.role))
                .into_iter()
                .map(MenuItem::from)
                .collect(),
        }
    }
}

/// Model for the login and registration pages.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthPage {
    pub page: String,
    pub brand: String,
    /// Where to send the user after a successful login.
    pub from: Option<String>,
}

/// Hand-over from the external login flow.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdoptSessionRequest {
    pub token: String,
    /// If given, must be the id of the user the token belongs to.
    pub user_id: Option<u64>,
    pub from: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub user_id: u64,
    pub role: String,
    /// Where the browser should navigate next.
    pub redirect: String,
}

//=========================================================================================
// Health
//=========================================================================================

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "The gateway is up"))
)]
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
