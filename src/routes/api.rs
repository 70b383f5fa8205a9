use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// API Router Module
///
/// Endpoints this server answers itself. They live under `/api`, which the route guard's path
/// filter excludes, so none of them redirect; each handler decides its own response.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // GET /api/health
        // Liveness probe for load balancers and the container runtime.
        .route("/api/health", get(handlers::health))
        // GET /api/session
        // What the server knows about the caller's session cookie.
        .route("/api/session", get(handlers::get_session))
        // POST /api/auth/logout
        // Emits a removal cookie for `auth-token`.
        .route("/api/auth/logout", post(handlers::logout))
}
