use std::env;

use thiserror::Error;

/// AppConfig
///
/// Holds the console server's entire configuration state. Loaded once at startup and then
/// shared immutably with every request through `AppState` (pulled out via `FromRef`).
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls defaults (tunnel header, cookie flags, log format).
    pub env: Env,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Base URL of the backend REST API that `/api/proxy/*` forwards to.
    pub api_upstream: String,
    // Directory holding the exported dashboard pages.
    pub static_dir: String,
    // HS256 secret for session tokens. When unset, the session cookie is treated as opaque
    // and capability gating is disabled.
    pub session_secret: Option<String>,
    // Inject `ngrok-skip-browser-warning: true` into proxied requests.
    pub skip_tunnel_warning: bool,
    // Mark cookies issued by this server as `Secure`.
    pub cookie_secure: bool,
    // Upstream request timeout for the API proxy, in seconds.
    pub proxy_timeout_secs: u64,
}

/// Env
///
/// Defines the runtime context, used to switch between development conveniences (tunnel header,
/// pretty logs) and production behaviour (mandatory upstream, secure cookies, JSON logs).
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_LOCAL_UPSTREAM: &str = "http://localhost:8080";
const DEFAULT_STATIC_DIR: &str = "out";
const DEFAULT_PROXY_TIMEOUT_SECS: u64 = 30;

impl Default for AppConfig {
    /// default
    ///
    /// Safe local configuration for test setup; no environment variables are read.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            api_upstream: DEFAULT_LOCAL_UPSTREAM.to_string(),
            static_dir: DEFAULT_STATIC_DIR.to_string(),
            session_secret: None,
            skip_tunnel_warning: true,
            cookie_secure: false,
            proxy_timeout_secs: DEFAULT_PROXY_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables. Production is fail-fast: a missing
    /// `API_UPSTREAM_URL` is an error rather than a silent fallback to localhost.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let api_upstream = match env {
            Env::Production => {
                non_empty_var("API_UPSTREAM_URL").ok_or(ConfigError::Missing("API_UPSTREAM_URL"))?
            }
            Env::Local => {
                non_empty_var("API_UPSTREAM_URL").unwrap_or_else(|| DEFAULT_LOCAL_UPSTREAM.to_string())
            }
        };

        // The tunnel warning only exists in front of development backends.
        let skip_tunnel_warning =
            env_bool("PROXY_SKIP_TUNNEL_WARNING")?.unwrap_or(env == Env::Local);
        let cookie_secure = env_bool("COOKIE_SECURE")?.unwrap_or(env == Env::Production);

        let proxy_timeout_secs = match non_empty_var("PROXY_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "PROXY_TIMEOUT_SECS",
                value: raw,
            })?,
            None => DEFAULT_PROXY_TIMEOUT_SECS,
        };

        Ok(Self {
            bind_addr: non_empty_var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            api_upstream,
            static_dir: non_empty_var("STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string()),
            session_secret: non_empty_var("SESSION_JWT_SECRET"),
            skip_tunnel_warning,
            cookie_secure,
            proxy_timeout_secs,
            env,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// env_bool
///
/// Parses a boolean flag. Unset means `None`; an unrecognised value is a configuration error.
pub fn env_bool(key: &'static str) -> Result<Option<bool>, ConfigError> {
    let Some(raw) = non_empty_var(key) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::Invalid { key, value: raw }),
    }
}
