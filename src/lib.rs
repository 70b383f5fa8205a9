use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Request-time access control.
pub mod auth;
pub mod capability;
pub mod guard;

// Backend relay and the console server's own endpoints.
pub mod handlers;
pub mod models;
pub mod proxy;

pub mod config;
pub mod wallet;

// Module for routing segregation (API, Proxy, Pages).
pub mod routes;
use routes::{api, pages, proxy as proxy_routes};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use guard::{Decision, RouteClass};

/// ApiDoc
///
/// Auto-generated OpenAPI document for the endpoints this server answers itself. Proxied
/// backend calls are documented by the backend. Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::health, handlers::get_session, handlers::logout),
    components(schemas(models::SessionView, capability::Role, capability::Capability)),
    tags(
        (name = "rollup-console", description = "Rollup console front-door server")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable state handed to every request: the loaded configuration and the pooled
/// HTTP client used by the API proxy.
#[derive(Clone)]
pub struct AppState {
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
    /// Upstream client for `/api/proxy/*`. Cloning shares the connection pool.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: AppConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the console server: own API routes, the backend proxy, the static dashboard as
/// fallback, and the guard layers that run ahead of every page.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api::api_routes())
        .merge(proxy_routes::proxy_routes(state.clone()))
        // Everything else is a dashboard page.
        .fallback_service(pages::pages_service(&state.config.static_dir))
        .with_state(state.clone());

    // 3. Access Control Layers
    // The route guard is added last so it runs first: anonymous visitors are redirected before
    // the capability gate ever looks at a token.
    let guarded_router = base_router
        .layer(middleware::from_fn_with_state(
            state,
            auth::capability_gate,
        ))
        .layer(middleware::from_fn(guard::route_guard));

    // 4. Observability and Correlation Layers
    guarded_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 5. CORS Layer (outermost)
        .layer(cors)
}

/// trace_span_logger
///
/// Per-request span. Carries the `x-request-id` set by `SetRequestIdLayer`, the route class of
/// the path, and whether the request is a page the guard inspects or a proxied API call. The
/// `guard` field is filled in by `guard::route_guard` once it has decided.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");
    let path = request.uri().path();

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        path,
        req_id = %request_id,
        route = ?RouteClass::classify(path),
        guarded = guard::is_guarded(path),
        proxied = proxy::is_proxy_path(path),
        guard = tracing::field::Empty,
    )
}
