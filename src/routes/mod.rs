/// Router Module Index
///
/// Splits the console server's surface by who handles the request: the server's own API,
/// calls relayed to the backend, and the exported dashboard pages. Guarding is layered on
/// top of all three in `create_router`; the route guard's path filter decides which of them
/// it actually inspects.

/// Endpoints answered by this server (`/api/health`, `/api/session`, `/api/auth/logout`).
pub mod api;

/// `/api/proxy/*`, forwarded to the backend REST API behind the tunnel-header interceptor.
pub mod proxy;

/// Static dashboard pages served from the export directory.
pub mod pages;
