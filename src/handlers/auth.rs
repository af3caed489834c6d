//! HTTP handlers for registration, login, and logout.
//!
//! All three are browser form flows, so success responses are redirects and
//! the session rides in an HTTP-only cookie.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect},
    Form, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use serde_json::json;

use crate::{errors::ServiceError, AppState};

/// Name of the session cookie. The value is an opaque random token; only its
/// digest is stored server-side.
pub const SESSION_COOKIE: &str = "waybill_session";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password1: String,
    pub password2: String,
}

/// GET /login
pub async fn login_page() -> Json<serde_json::Value> {
    Json(json!({ "page": "login", "fields": ["username", "password"] }))
}

/// GET /register
pub async fn register_page() -> Json<serde_json::Value> {
    Json(json!({ "page": "register", "fields": ["username", "password1", "password2"] }))
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse, ServiceError> {
    let token = state
        .services
        .auth
        .login(&form.username, &form.password)
        .await?;
    Ok((jar.add(session_cookie(token)), Redirect::to("/")))
}

/// POST /register
///
/// A successful registration opens a session immediately, so the new user
/// lands logged in.
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<impl IntoResponse, ServiceError> {
    let token = state
        .services
        .auth
        .register(&form.username, &form.password1, &form.password2)
        .await?;
    Ok((jar.add(session_cookie(token)), Redirect::to("/")))
}

/// POST /logout
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ServiceError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.services.auth.logout(cookie.value()).await?;
    }

    let mut removal = Cookie::from(SESSION_COOKIE);
    removal.set_path("/");
    Ok((jar.remove(removal), Redirect::to("/")))
}

fn session_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie
}
