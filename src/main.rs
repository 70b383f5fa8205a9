use rollup_console::{
    AppState,
    config::{AppConfig, Env},
    create_router, proxy,
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Entry point: loads configuration, installs logging, builds the upstream HTTP client and
/// serves the console until Ctrl-C.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    // 2. Logging Filter Setup
    // RUST_LOG wins; otherwise fall back to verbose defaults for local development.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rollup_console=debug,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // JSON lines for the log aggregator.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Console server starting in {:?} mode", config.env);
    if config.session_secret.is_none() {
        tracing::warn!("SESSION_JWT_SECRET not set: session cookies are presence-only, capability gating disabled");
    }
    if config.skip_tunnel_warning {
        tracing::info!("Injecting tunnel-warning header into proxied API calls");
    }

    // 4. Upstream Client for the API proxy
    let http = proxy::upstream_client(&config).expect("FATAL: Failed to build the upstream HTTP client.");

    let bind_addr = config.bind_addr.clone();
    tracing::info!(upstream = %config.api_upstream, static_dir = %config.static_dir, "Routing configured");

    // 5. Router and Server Startup
    let app = create_router(AppState::new(config, http));

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the listen address. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        // Without a signal handler, keep serving until the process is killed.
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections");
}
