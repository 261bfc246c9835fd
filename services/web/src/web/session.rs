//! services/web/src/web/session.rs
//!
//! The session accessor: where the session token lives and how it is read,
//! written and attached to backend requests.
//!
//! The `token` cookie is the source of truth. It is visible to the route gate,
//! which runs before any page code. Page code reads the mirrored copy in a
//! `TokenStore`, kept per user under `token:<userId>`. The mirror is only ever
//! touched for a user id the backend returned for the token; the `userId`
//! cookie is a hint for the browser and is never trusted to pick a slot.
//! [`SessionAccessor::reconcile`] brings the mirror back in line with the
//! cookie, and every write goes through [`SessionAccessor::write_session`] /
//! [`SessionAccessor::clear_session`] so both copies change together.

use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderValue};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use nodo_core::domain::SessionToken;
use nodo_core::events::{TokenEvent, TokenEvents};
use nodo_core::ports::TokenStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Cookie holding the bearer credential.
pub const TOKEN_COOKIE: &str = "token";
/// Cookie holding the numeric user identifier.
pub const USER_ID_COOKIE: &str = "userId";
/// Logical key of the token in the page-side store.
pub const TOKEN_KEY: &str = "token";

//=========================================================================================
// Reading
//=========================================================================================

/// Where a token is being read from.
pub enum TokenContext<'a> {
    /// Request-time code (the route gate): the incoming cookies.
    Edge(&'a CookieJar),
    /// Page code: the page-side token store.
    Page(PageStore<'a>),
}

/// One user's slot in the page-side token store.
#[derive(Clone, Copy)]
pub struct PageStore<'a> {
    store: &'a dyn TokenStore,
    user_id: u64,
}

impl<'a> PageStore<'a> {
    pub fn new(store: &'a dyn TokenStore, user_id: u64) -> Self {
        Self { store, user_id }
    }

    pub fn key(&self) -> String {
        format!("{}:{}", TOKEN_KEY, self.user_id)
    }

    pub fn read(&self) -> Option<SessionToken> {
        self.store.get(&self.key()).and_then(SessionToken::new)
    }

    fn write(&self, token: &SessionToken) {
        self.store.set(&self.key(), token.as_str());
    }

    fn clear(&self) {
        self.store.remove(&self.key());
    }
}

pub fn token(context: TokenContext<'_>) -> Option<SessionToken> {
    match context {
        TokenContext::Edge(jar) => jar
            .get(TOKEN_COOKIE)
            .and_then(|cookie| SessionToken::new(cookie.value())),
        TokenContext::Page(page) => page.read(),
    }
}

pub fn user_id(jar: &CookieJar) -> Option<u64> {
    jar.get(USER_ID_COOKIE)
        .and_then(|cookie| cookie.value().trim().parse().ok())
}

/// Headers for an authenticated backend request.
///
/// An explicit `token` wins; otherwise the page store is consulted. With no
/// token anywhere the result is empty and a warning is logged: the request
/// goes out unauthenticated and the backend decides what to do with it.
pub fn auth_headers(token: Option<&SessionToken>, page: Option<PageStore<'_>>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let stored;
    let token = match token {
        Some(token) => token,
        None => {
            stored = page.and_then(|page| page.read());
            match &stored {
                Some(token) => token,
                None => {
                    warn!("No session token available; sending request without Authorization");
                    return headers;
                }
            }
        }
    };

    match HeaderValue::from_str(&token.bearer()) {
        Ok(value) => {
            headers.insert(AUTHORIZATION, value);
        }
        Err(_) => warn!("Session token is not a valid header value; dropping Authorization"),
    }
    headers
}

//=========================================================================================
// Writing
//=========================================================================================

#[derive(Clone, Debug)]
pub struct CookieSettings {
    pub secure: bool,
    pub max_age_days: i64,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: true,
            max_age_days: 30,
        }
    }
}

/// Owns the write path for both token copies and announces every change.
#[derive(Clone)]
pub struct SessionAccessor {
    store: Arc<dyn TokenStore>,
    events: TokenEvents,
    cookies: CookieSettings,
}

impl SessionAccessor {
    pub fn new(store: Arc<dyn TokenStore>, events: TokenEvents, cookies: CookieSettings) -> Self {
        Self {
            store,
            events,
            cookies,
        }
    }

    pub fn page(&self, user_id: u64) -> PageStore<'_> {
        PageStore::new(self.store.as_ref(), user_id)
    }

    pub fn events(&self) -> &TokenEvents {
        &self.events
    }

    /// Stores a new session for a verified `user_id` in the cookies and the
    /// page store, then publishes `TokenEvent::Set`.
    pub fn write_session(&self, jar: CookieJar, token: &SessionToken, user_id: u64) -> CookieJar {
        self.page(user_id).write(token);

        let jar = jar
            .add(self.cookie(TOKEN_COOKIE, token.as_str().to_string()))
            .add(self.cookie(USER_ID_COOKIE, user_id.to_string()));

        self.events.publish(TokenEvent::Set { user_id });
        jar
    }

    /// Removes the session cookies. The page store and subscribers are only
    /// told when the session belonged to a known user.
    pub fn clear_session(&self, jar: CookieJar, user_id: Option<u64>) -> CookieJar {
        if let Some(user_id) = user_id {
            self.forget(user_id);
        }
        jar.remove(Cookie::build(TOKEN_COOKIE).path("/"))
            .remove(Cookie::build(USER_ID_COOKIE).path("/"))
    }

    /// Drops a user's page-side token and publishes `TokenEvent::Cleared`.
    pub fn forget(&self, user_id: u64) {
        self.page(user_id).clear();
        self.events.publish(TokenEvent::Cleared { user_id });
    }

    /// Makes the page store for the verified `user_id` agree with the cookie
    /// token. The cookie always wins.
    pub fn reconcile(&self, cookie: &SessionToken, user_id: u64) {
        let page = self.page(user_id);
        match token(TokenContext::Page(page)) {
            Some(stored) if stored == *cookie => {}
            Some(_) => {
                info!(key = %page.key(), "Page token diverged from cookie; taking the cookie");
                page.write(cookie);
            }
            None => page.write(cookie),
        }
    }

    /// Re-issues the `userId` cookie when it does not name the verified user.
    pub fn pin_user_id(&self, jar: CookieJar, user_id: u64) -> CookieJar {
        if self::user_id(&jar) == Some(user_id) {
            return jar;
        }
        debug!(user_id, "Correcting the userId cookie");
        jar.add(self.cookie(USER_ID_COOKIE, user_id.to_string()))
    }

    fn cookie(&self, name: &'static str, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.cookies.secure)
            .max_age(time::Duration::days(self.cookies.max_age_days))
            .build()
    }
}
