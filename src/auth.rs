use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    capability::{self, Access, Role, Subject},
    config::AppConfig,
    guard,
};

/// Name of the cookie carrying the session credential.
pub const SESSION_COOKIE: &str = "auth-token";

/// SessionClaims
///
/// Payload of a session token issued by the backend's authentication flow.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (sub): the backend's user identifier.
    pub sub: String,
    /// Role granted to the user; maps to a capability set.
    pub role: Role,
    /// Expiration Time (exp): the token is rejected after this instant.
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
}

/// SessionUser
///
/// Identity resolved from a verified session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub role: Role,
}

impl SessionUser {
    pub fn subject(&self) -> Subject {
        Subject::from(self.role)
    }
}

/// Session
///
/// What the request's cookie tells us about the visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    /// No session cookie, or an empty one.
    Anonymous,
    /// A cookie is present but no secret is configured to verify it.
    Opaque,
    Verified(SessionUser),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("session token expired")]
    Expired,
    #[error("invalid session token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

/// session_token
///
/// The session credential, if the cookie is present and non-empty. Presence is all the route
/// guard needs; nothing about the value is interpreted here.
pub fn session_token(jar: &CookieJar) -> Option<&str> {
    jar.get(SESSION_COOKIE)
        .map(Cookie::value)
        .filter(|value| !value.is_empty())
}

/// removal_cookie
///
/// A `Set-Cookie` that deletes the session credential from the browser.
pub fn removal_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build();
    cookie.make_removal();
    cookie
}

/// verify_token
///
/// Decodes an HS256 session token and validates its expiry.
pub fn verify_token(token: &str, secret: &str) -> Result<SessionClaims, AuthError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    match decode::<SessionClaims>(token, &decoding_key, &validation) {
        Ok(data) => Ok(data.claims),
        Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => Err(AuthError::Expired),
        Err(e) => Err(AuthError::InvalidToken(e)),
    }
}

/// resolve_session
///
/// Classifies the cookie jar into a `Session` given the configured secret.
pub fn resolve_session(jar: &CookieJar, secret: Option<&str>) -> Result<Session, AuthError> {
    let Some(token) = session_token(jar) else {
        return Ok(Session::Anonymous);
    };
    let Some(secret) = secret else {
        return Ok(Session::Opaque);
    };

    let claims = verify_token(token, secret)?;
    Ok(Session::Verified(SessionUser {
        id: claims.sub,
        role: claims.role,
    }))
}

/// Session Extractor Implementation
///
/// Pulls `AppConfig` from the application state to learn the session secret, then resolves the
/// cookie. Rejects with 401 when a configured secret fails to verify the token.
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        resolve_session(&jar, config.session_secret.as_deref())
    }
}

/// capability_gate
///
/// Runs after the route guard on page requests. For verified sessions it enforces the
/// capability the path requires; a token that no longer verifies is treated as no credential at
/// all: the cookie is cleared so the login page does not bounce the visitor straight back.
/// Anonymous and opaque sessions are left to the route guard.
pub async fn capability_gate(
    State(config): State<AppConfig>,
    session: Result<Session, AuthError>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if !guard::is_guarded(path) {
        return next.run(request).await;
    }

    let required = capability::required_capabilities(path);
    if required.is_empty() {
        return next.run(request).await;
    }

    match session {
        Ok(Session::Verified(user)) => match capability::check(&user.subject(), required) {
            Access::Allow => next.run(request).await,
            Access::Deny { missing } => {
                tracing::warn!(user = %user.id, path, ?missing, "capability check denied");
                StatusCode::FORBIDDEN.into_response()
            }
        },
        Ok(Session::Anonymous | Session::Opaque) => next.run(request).await,
        Err(e) => {
            tracing::debug!(path, error = %e, "session token rejected");
            let jar = CookieJar::new().add(removal_cookie(config.cookie_secure));
            (jar, Redirect::temporary(&guard::login_redirect(path))).into_response()
        }
    }
}
