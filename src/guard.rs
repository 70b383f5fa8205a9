use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::auth;

/// Page prefixes that require a session credential.
pub const PROTECTED_PREFIXES: &[&str] = &["/dashboard", "/admin", "/settings"];

/// Page prefixes explicitly open to anonymous visitors.
pub const PUBLIC_PREFIXES: &[&str] = &["/auth", "/design-system"];

/// Prefixes the guard never looks at (API traffic and build assets).
pub const EXCLUDED_PREFIXES: &[&str] = &["/api", "/_next/static", "/_next/image"];

pub const FAVICON_PATH: &str = "/favicon.ico";
pub const LOGIN_ROUTE: &str = "/auth";
pub const DASHBOARD_ROUTE: &str = "/dashboard";
pub const ROOT_ROUTE: &str = "/";

/// RouteClass
///
/// The category a page path falls into. Derived from the path alone, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Protected,
    Public,
    Root,
    Unclassified,
}

impl RouteClass {
    /// classify
    ///
    /// Plain prefix matching, mirroring how the dashboard lays out its pages: `/dashboardx`
    /// counts as protected just like `/dashboard/x`.
    pub fn classify(path: &str) -> Self {
        if PROTECTED_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
            Self::Protected
        } else if PUBLIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
            Self::Public
        } else if path == ROOT_ROUTE {
            Self::Root
        } else {
            Self::Unclassified
        }
    }
}

/// Decision
///
/// The three possible outcomes of running the guard on a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    PassThrough,
    /// Send the visitor to the login page, remembering where they were headed.
    RedirectToLogin { return_to: String },
    RedirectToDashboard,
}

impl Decision {
    /// The `Location` this decision redirects to, if any.
    pub fn location(&self) -> Option<String> {
        match self {
            Self::PassThrough => None,
            Self::RedirectToLogin { return_to } => Some(login_redirect(return_to)),
            Self::RedirectToDashboard => Some(DASHBOARD_ROUTE.to_string()),
        }
    }
}

/// is_guarded
///
/// The path filter applied before any classification. API calls, Next.js build assets and the
/// favicon bypass the guard entirely.
pub fn is_guarded(path: &str) -> bool {
    path != FAVICON_PATH && !EXCLUDED_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// decide
///
/// Pure decision function over (path, credential presence). Redirect rules are evaluated in a
/// fixed priority order; anything not matched passes through.
pub fn decide(path: &str, has_credential: bool) -> Decision {
    match RouteClass::classify(path) {
        RouteClass::Protected if !has_credential => Decision::RedirectToLogin {
            return_to: path.to_string(),
        },
        RouteClass::Public if has_credential && path == LOGIN_ROUTE => Decision::RedirectToDashboard,
        RouteClass::Root if has_credential => Decision::RedirectToDashboard,
        _ => Decision::PassThrough,
    }
}

/// Builds `/auth?redirect=<path>` with the original path percent-encoded.
pub fn login_redirect(return_to: &str) -> String {
    format!("{LOGIN_ROUTE}?redirect={}", urlencoding::encode(return_to))
}

/// route_guard
///
/// Middleware wrapping every page request. Reads the session cookie (read-only) and either
/// forwards the request or answers with a 307 redirect.
pub async fn route_guard(request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if !is_guarded(path) {
        return next.run(request).await;
    }

    let jar = CookieJar::from_headers(request.headers());
    let has_credential = auth::session_token(&jar).is_some();

    let decision = decide(path, has_credential);
    tracing::Span::current().record("guard", tracing::field::debug(&decision));
    match decision.location() {
        Some(location) => {
            tracing::debug!(path, ?decision, "route guard redirect");
            Redirect::temporary(&location).into_response()
        }
        None => next.run(request).await,
    }
}
