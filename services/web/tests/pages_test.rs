//! Page-layer authorization and the session lifecycle.

mod helpers;

use axum::http::StatusCode;
use helpers::{json, location, set_cookies, spawn_app, user, FakeDirectory};
use nodo_core::events::TokenEvent;
use nodo_core::ports::TokenStore;
use nodo_core::roles::Role;
use serde_json::json;

#[tokio::test]
async fn client_dashboard_gets_the_reduced_menu() {
    let app = spawn_app(FakeDirectory::default().with_user("tok-c", user(4, Role::Client)));

    let response = app
        .get("/dashboard/mis-cursos", Some("token=tok-c; userId=4"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json(response).await;
    assert_eq!(body["page"], "mis-cursos");
    assert_eq!(body["brand"], "nodo");
    assert_eq!(body["home"], "/dashboard/cursos");
    assert_eq!(body["user"]["role"], "client");
    let menu: Vec<&str> = body["menu"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["label"].as_str().unwrap())
        .collect();
    assert_eq!(menu, ["Proyectos", "Mi perfil"]);
}

#[tokio::test]
async fn admin_pages_serve_admin_like_roles() {
    let app = spawn_app(
        FakeDirectory::default().with_user("tok-g", user(2, Role::ProjectManager)),
    );

    let response = app
        .get("/admin/proyectos", Some("token=tok-g; userId=2"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json(response).await;
    assert_eq!(body["home"], "/admin/proyectos");
    assert_eq!(body["menu"].as_array().unwrap().len(), 5);
    assert_eq!(body["menu"][3]["path"], "/admin/usuarios");
}

#[tokio::test]
async fn admin_pages_send_clients_to_their_landing_route() {
    let app = spawn_app(FakeDirectory::default().with_user("tok-c", user(4, Role::Authenticated)));

    let response = app.get("/admin/usuarios", Some("token=tok-c; userId=4")).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/dashboard/cursos");
}

#[tokio::test]
async fn unknown_roles_are_treated_as_least_privilege() {
    let app = spawn_app(
        FakeDirectory::default().with_user("tok-x", user(9, Role::Unknown("owner".to_string()))),
    );

    let response = app.get("/admin/proyectos", Some("token=tok-x; userId=9")).await;
    assert_eq!(location(&response), "/login");

    let response = app.get("/dashboard/mi-perfil", Some("token=tok-x; userId=9")).await;
    let body = json(response).await;
    assert_eq!(body["menu"].as_array().unwrap().len(), 2);
    assert_eq!(body["home"], "/login");
}

#[tokio::test]
async fn bynodo_pages_carry_their_brand() {
    let app = spawn_app(FakeDirectory::default().with_user("tok-c", user(4, Role::Client)));

    let response = app
        .get("/bynodo/dashboard/mis-cursos", Some("token=tok-c; userId=4"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["brand"], "bynodo");
}

#[tokio::test]
async fn current_user_is_fetched_once_per_session() {
    let app = spawn_app(FakeDirectory::default().with_user("tok-c", user(4, Role::Client)));

    for page in ["/dashboard/mis-cursos", "/dashboard/mis-pagos", "/dashboard/mi-perfil"] {
        let response = app.get(page, Some("token=tok-c; userId=4")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(app.directory.calls(), 1);
    assert_eq!(app.state.sessions.active().await, 1);
}

#[tokio::test]
async fn page_store_is_reconciled_toward_the_cookie() {
    let app = spawn_app(FakeDirectory::default().with_user("tok-c", user(4, Role::Client)));
    app.store.set("token:4", "stale");

    let response = app.get("/dashboard/mis-cursos", Some("token=tok-c; userId=4")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.store.get("token:4").as_deref(), Some("tok-c"));
}

#[tokio::test]
async fn rejected_tokens_clear_the_session_cookies() {
    let app = spawn_app(FakeDirectory::default());

    let response = app.get("/dashboard/mis-cursos", Some("token=revoked; userId=4")).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login?from=%2Fdashboard%2Fmis-cursos");

    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("token=;")), "{:?}", cookies);
    assert!(cookies.iter().any(|c| c.starts_with("userId=;")), "{:?}", cookies);
}

#[tokio::test]
async fn blocked_users_are_signed_out() {
    let mut blocked = user(5, Role::Client);
    blocked.blocked = true;
    let app = spawn_app(FakeDirectory::default().with_user("tok-b", blocked));

    let response = app.get("/dashboard/mis-cursos", Some("token=tok-b; userId=5")).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(app.state.sessions.active().await, 0);
}

#[tokio::test]
async fn backend_outages_surface_as_bad_gateway() {
    let app = spawn_app(FakeDirectory::unreachable());

    let response = app.get("/dashboard/mis-cursos", Some("token=tok-c")).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn adopting_a_session_sets_cookies_and_announces_it() {
    let app = spawn_app(FakeDirectory::default().with_user("tok-a", user(1, Role::Admin)));
    let mut events = app.state.accessor.events().subscribe();

    let response = app
        .post_json("/session", None, json!({ "token": "tok-a" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("token=tok-a")), "{:?}", cookies);
    assert!(cookies.iter().any(|c| c.starts_with("userId=1")), "{:?}", cookies);

    let body = json(response).await;
    assert_eq!(body["redirect"], "/admin/proyectos");
    assert_eq!(body["role"], "admin");

    assert_eq!(app.store.get("token:1").as_deref(), Some("tok-a"));
    assert_eq!(events.recv().await.unwrap(), TokenEvent::Set { user_id: 1 });
}

#[tokio::test]
async fn adopting_a_session_honours_a_local_return_path() {
    let app = spawn_app(FakeDirectory::default().with_user("tok-c", user(4, Role::Client)));

    let response = app
        .post_json(
            "/session",
            None,
            json!({ "token": "tok-c", "from": "/dashboard/mis-pagos" }),
        )
        .await;
    assert_eq!(json(response).await["redirect"], "/dashboard/mis-pagos");

    let response = app
        .post_json(
            "/session",
            None,
            json!({ "token": "tok-c", "from": "//evil.example" }),
        )
        .await;
    assert_eq!(json(response).await["redirect"], "/dashboard/cursos");
}

#[tokio::test]
async fn adopting_an_invalid_session_is_refused() {
    let app = spawn_app(FakeDirectory::default());

    let response = app.post_json("/session", None, json!({ "token": "  " })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.post_json("/session", None, json!({ "token": "nope" })).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn logout_ends_the_session_everywhere() {
    let app = spawn_app(FakeDirectory::default().with_user("tok-c", user(4, Role::Client)));
    let cookies = Some("token=tok-c; userId=4");

    app.get("/dashboard/mis-cursos", cookies).await;
    assert_eq!(app.state.sessions.active().await, 1);

    let mut events = app.state.accessor.events().subscribe();
    let response = app.post_json("/logout", cookies, json!({})).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    assert_eq!(app.state.sessions.active().await, 0);
    assert!(app.store.get("token:4").is_none());
    assert_eq!(events.recv().await.unwrap(), TokenEvent::Cleared { user_id: 4 });
}

#[tokio::test]
async fn login_page_echoes_only_local_return_paths() {
    let app = spawn_app(FakeDirectory::default());

    let body = json(app.get("/login?from=%2Fdashboard%2Fmi-perfil", None).await).await;
    assert_eq!(body["page"], "login");
    assert_eq!(body["from"], "/dashboard/mi-perfil");

    let body = json(app.get("/login?from=https%3A%2F%2Fevil.example", None).await).await;
    assert!(body["from"].is_null());

    // Browsers strip the tab, which would leave `//evil.example`.
    let body = json(app.get("/login?from=%2F%09%2Fevil.example", None).await).await;
    assert!(body["from"].is_null());
}

#[tokio::test]
async fn adopting_a_session_for_another_user_is_refused() {
    let app = spawn_app(FakeDirectory::default().with_user("tok-1", user(1, Role::Client)));
    let mut events = app.state.accessor.events().subscribe();

    let response = app
        .post_json("/session", None, json!({ "token": "tok-1", "user_id": 5 }))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(set_cookies(&response).is_empty());
    assert!(app.store.get("token:5").is_none());
    assert!(app.store.get("token:1").is_none());
    assert_eq!(app.state.sessions.active().await, 0);
    assert!(events.try_recv().is_err());

    let response = app
        .post_json("/session", None, json!({ "token": "tok-1", "user_id": 1 }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["user_id"], 1);
}

#[tokio::test]
async fn adopting_a_new_session_retires_the_previous_user() {
    let app = spawn_app(
        FakeDirectory::default()
            .with_user("tok-a", user(1, Role::Admin))
            .with_user("tok-c", user(4, Role::Client)),
    );
    app.get("/admin/proyectos", Some("token=tok-a; userId=1")).await;
    assert_eq!(app.store.get("token:1").as_deref(), Some("tok-a"));

    let mut events = app.state.accessor.events().subscribe();
    let response = app
        .post_json("/session", Some("token=tok-a; userId=1"), json!({ "token": "tok-c" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert!(app.store.get("token:1").is_none());
    assert_eq!(app.store.get("token:4").as_deref(), Some("tok-c"));
    assert_eq!(app.state.sessions.active().await, 1);
    assert_eq!(events.recv().await.unwrap(), TokenEvent::Cleared { user_id: 1 });
    assert_eq!(events.recv().await.unwrap(), TokenEvent::Set { user_id: 4 });
}

#[tokio::test]
async fn forged_user_id_cookies_never_touch_another_users_slot() {
    let app = spawn_app(FakeDirectory::default().with_user("tok-c", user(7, Role::Client)));
    app.store.set("token:4", "tok-4");

    for cookies in ["token=junk; userId=4", "userId=4", "token=tok-c; userId=4"] {
        app.get("/dashboard/mis-cursos", Some(cookies)).await;
        assert_eq!(app.store.get("token:4").as_deref(), Some("tok-4"), "{}", cookies);
    }
    assert_eq!(app.store.get("token:7").as_deref(), Some("tok-c"));
}

#[tokio::test]
async fn page_store_is_keyed_by_the_verified_user() {
    let app = spawn_app(FakeDirectory::default().with_user("tok-a", user(4, Role::Client)));

    let response = app.get("/dashboard/mis-cursos", Some("token=tok-a")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("userId=4")), "{:?}", cookies);
    assert_eq!(app.store.get("token:4").as_deref(), Some("tok-a"));
    assert!(app.store.get("token").is_none());
}
