use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    auth::{self, Session},
    config::AppConfig,
    models::SessionView,
};

/// health
///
/// [Public Route] Liveness probe for load balancers. Returns "ok" immediately.
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}

/// get_session
///
/// [Public Route] Describes the caller's session as seen by the console server.
///
/// *Note*: Without `SESSION_JWT_SECRET` the cookie cannot be verified, so only `authenticated`
/// is reported. With a secret, an expired or forged token is rejected by the `Session`
/// extractor with 401.
#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Current session", body = SessionView),
        (status = 401, description = "Session token failed verification")
    )
)]
pub async fn get_session(session: Session) -> Json<SessionView> {
    Json(SessionView::from(&session))
}

/// logout
///
/// [Public Route] Clears the session cookie. The token itself is revoked by the backend; this
/// only removes it from the browser so the route guard sees an anonymous visitor.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 204, description = "Session cookie cleared"))
)]
pub async fn logout(State(config): State<AppConfig>, jar: CookieJar) -> impl IntoResponse {
    // Emitted even when the request carried no cookie.
    tracing::debug!("clearing session cookie");
    (jar.add(auth::removal_cookie(config.cookie_secure)), StatusCode::NO_CONTENT)
}
