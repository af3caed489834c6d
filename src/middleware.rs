//! Session gate for routes that require a logged-in user.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::{errors::ServiceError, handlers::auth::SESSION_COOKIE, AppState};

/// Resolves the session cookie to a live user or bounces to `/login`.
///
/// Applied per route with `middleware::from_fn_with_state`, so the gated
/// surface is visible in the router itself. The resolved user is stored in
/// request extensions for downstream handlers.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or(ServiceError::Unauthenticated)?;

    let user = state
        .services
        .auth
        .authenticate(&token)
        .await
        .map_err(|err| match err {
            // Database failures stay 500s; everything else means no session.
            ServiceError::DatabaseError(e) => ServiceError::DatabaseError(e),
            _ => ServiceError::Unauthenticated,
        })?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
