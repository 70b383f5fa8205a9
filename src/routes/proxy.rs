use crate::{AppState, proxy};
use axum::{Router, middleware, routing::any};

/// Proxy Router Module
///
/// Every method under `/api/proxy` is relayed to the backend. The tunnel-header interceptor is
/// attached as a route layer so it only ever sees proxied traffic.
pub fn proxy_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/proxy", any(proxy::forward))
        // The catch-all needs a non-empty remainder, so the bare trailing slash gets its own route.
        .route("/api/proxy/", any(proxy::forward))
        .route("/api/proxy/{*path}", any(proxy::forward))
        .route_layer(middleware::from_fn_with_state(
            state,
            proxy::skip_tunnel_warning,
        ))
}
