use axum::{
    extract::FromRequestParts,
    http::{Method, Request, Uri, header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{EncodingKey, Header, encode};
use rollup_console::{
    AppState,
    auth::{AuthError, Session, SessionClaims, SessionUser, resolve_session, session_token, verify_token},
    capability::Role,
    config::AppConfig,
};
use std::time::SystemTime;

// --- Helper Functions ---

const TEST_SESSION_SECRET: &str = "test-secret-value-1234567890";
const TEST_USER_ID: &str = "user-0001";

fn create_token(role: Role, exp_offset: i64, secret: &str) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let claims = SessionClaims {
        sub: TEST_USER_ID.to_string(),
        role,
        iat: now as usize,
        exp: (now + exp_offset) as usize,
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn create_app_state(session_secret: Option<&str>) -> AppState {
    let config = AppConfig {
        session_secret: session_secret.map(str::to_string),
        ..AppConfig::default()
    };
    AppState::new(config, reqwest::Client::new())
}

/// Helper to get the Parts struct of a request carrying the given cookie header.
fn get_request_parts(cookie: Option<&str>) -> Parts {
    let mut builder = Request::builder()
        .method(Method::GET)
        .uri("/dashboard".parse::<Uri>().unwrap());
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let (parts, _) = builder.body(axum::body::Body::empty()).unwrap().into_parts();
    parts
}

fn jar(cookie: &str) -> CookieJar {
    CookieJar::from_headers(&get_request_parts(Some(cookie)).headers)
}

// --- Token handling ---

#[test]
fn test_session_token_requires_non_empty_cookie() {
    assert_eq!(session_token(&jar("auth-token=abc")), Some("abc"));
    assert_eq!(session_token(&jar("auth-token=")), None);
    assert_eq!(session_token(&jar("other=abc")), None);
    assert_eq!(session_token(&jar("theme=dark; auth-token=xyz")), Some("xyz"));
}

#[test]
fn test_verify_token_success() {
    let token = create_token(Role::Operator, 3600, TEST_SESSION_SECRET);
    let claims = verify_token(&token, TEST_SESSION_SECRET).unwrap();

    assert_eq!(claims.sub, TEST_USER_ID);
    assert_eq!(claims.role, Role::Operator);
}

#[test]
fn test_verify_token_expired() {
    let token = create_token(Role::Viewer, -3600, TEST_SESSION_SECRET);
    assert!(matches!(verify_token(&token, TEST_SESSION_SECRET), Err(AuthError::Expired)));
}

#[test]
fn test_verify_token_wrong_secret() {
    let token = create_token(Role::Viewer, 3600, "someone-elses-secret");
    assert!(matches!(
        verify_token(&token, TEST_SESSION_SECRET),
        Err(AuthError::InvalidToken(_))
    ));
}

#[test]
fn test_resolve_session_without_secret_is_opaque() {
    assert_eq!(resolve_session(&jar("auth-token=anything"), None).unwrap(), Session::Opaque);
    assert_eq!(resolve_session(&jar("theme=dark"), None).unwrap(), Session::Anonymous);
}

// --- Extractor ---

#[tokio::test]
async fn test_extractor_verifies_with_configured_secret() {
    let app_state = create_app_state(Some(TEST_SESSION_SECRET));
    let token = create_token(Role::Admin, 3600, TEST_SESSION_SECRET);
    let mut parts = get_request_parts(Some(&format!("auth-token={token}")));

    let session = Session::from_request_parts(&mut parts, &app_state).await.unwrap();

    assert_eq!(
        session,
        Session::Verified(SessionUser {
            id: TEST_USER_ID.to_string(),
            role: Role::Admin,
        })
    );
}

#[tokio::test]
async fn test_extractor_anonymous_without_cookie() {
    let app_state = create_app_state(Some(TEST_SESSION_SECRET));
    let mut parts = get_request_parts(None);

    let session = Session::from_request_parts(&mut parts, &app_state).await.unwrap();
    assert_eq!(session, Session::Anonymous);
}

#[tokio::test]
async fn test_extractor_rejects_garbage_token() {
    let app_state = create_app_state(Some(TEST_SESSION_SECRET));
    let mut parts = get_request_parts(Some("auth-token=not-a-jwt"));

    let session = Session::from_request_parts(&mut parts, &app_state).await;
    assert!(matches!(session, Err(AuthError::InvalidToken(_))));
}
