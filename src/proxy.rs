use axum::{
    body::{self, Body},
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use std::{error::Error as _, time::Duration};
use thiserror::Error;

use crate::{AppState, config::AppConfig};

/// Path prefix of API calls relayed to the backend.
pub const PROXY_PREFIX: &str = "/api/proxy";

/// Header that suppresses the tunnelling provider's browser interstitial.
pub const TUNNEL_WARNING_HEADER: &str = "ngrok-skip-browser-warning";

/// Largest request body the proxy will buffer before forwarding.
pub const MAX_PROXY_BODY_BYTES: usize = 10 * 1024 * 1024;

// Connection-scoped headers; never forwarded in either direction.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("failed to read request body: {0}")]
    Body(#[source] axum::Error),
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
    #[error("failed to build proxied response: {0}")]
    Response(#[from] axum::http::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "api proxy failure");
        let status = match &self {
            ProxyError::Body(e) if exceeded_body_limit(e) => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Body(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Upstream(_) | ProxyError::Response(_) => StatusCode::BAD_GATEWAY,
        };
        status.into_response()
    }
}

// `body::to_bytes` wraps the limit error, so look one level down.
fn exceeded_body_limit(error: &axum::Error) -> bool {
    error
        .source()
        .is_some_and(|source| source.is::<LengthLimitError>())
}

/// upstream_client
///
/// Pooled client for proxied calls; requests that outlive `proxy_timeout_secs` fail with 504.
pub fn upstream_client(config: &AppConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.proxy_timeout_secs))
        .build()
}

/// is_proxy_path
///
/// Matches `/api/proxy` and anything below it, but not siblings such as `/api/proxyfoo`.
pub fn is_proxy_path(path: &str) -> bool {
    path.strip_prefix(PROXY_PREFIX)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Inserts the tunnel-warning header, leaving every other header untouched.
pub fn inject_tunnel_header(headers: &mut HeaderMap) {
    headers.insert(TUNNEL_WARNING_HEADER, HeaderValue::from_static("true"));
}

/// skip_tunnel_warning
///
/// Interceptor in front of the proxy routes. Only active when the configuration enables it,
/// since the interstitial only exists on development tunnels.
pub async fn skip_tunnel_warning(
    State(config): State<AppConfig>,
    mut request: Request,
    next: Next,
) -> Response {
    if config.skip_tunnel_warning && is_proxy_path(request.uri().path()) {
        inject_tunnel_header(request.headers_mut());
    }
    next.run(request).await
}

/// upstream_url
///
/// Maps `/api/proxy/<rest>?<query>` onto the backend base URL.
pub fn upstream_url(base: &str, path: &str, query: Option<&str>) -> String {
    let rest = path.strip_prefix(PROXY_PREFIX).unwrap_or(path);
    let mut url = format!("{}{}", base.trim_end_matches('/'), rest);
    if let Some(query) = query {
        url.push('?');
        url.push_str(query);
    }
    url
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}

/// forward
///
/// Relays a proxied API call to the backend and returns its status, headers and buffered body.
pub async fn forward(State(state): State<AppState>, request: Request) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();
    let url = upstream_url(
        &state.config.api_upstream,
        parts.uri.path(),
        parts.uri.query(),
    );

    let body = body::to_bytes(body, MAX_PROXY_BODY_BYTES)
        .await
        .map_err(ProxyError::Body)?;

    let mut headers = parts.headers;
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);
    strip_hop_by_hop(&mut headers);

    tracing::debug!(method = %parts.method, %url, "forwarding api call");

    let upstream = state
        .http
        .request(parts.method, &url)
        .headers(headers)
        .body(body)
        .send()
        .await?;

    let status = upstream.status();
    let mut response_headers = upstream.headers().clone();
    response_headers.remove(header::CONTENT_LENGTH);
    strip_hop_by_hop(&mut response_headers);
    let bytes = upstream.bytes().await?;

    let mut response = Response::builder()
        .status(status)
        .body(Body::from(bytes))?;
    response.headers_mut().extend(response_headers);
    Ok(response)
}
