use rollup_console::{
    AppConfig,
    config::{ConfigError, Env},
};
use serial_test::serial;
use std::{env, panic};

const CONFIG_VARS: &[&str] = &[
    "APP_ENV",
    "BIND_ADDR",
    "API_UPSTREAM_URL",
    "STATIC_DIR",
    "SESSION_JWT_SECRET",
    "PROXY_SKIP_TUNNEL_WARNING",
    "COOKIE_SECURE",
    "PROXY_TIMEOUT_SECS",
];

// --- Setup/Teardown Utilities ---

/// Runs a test with a clean set of configuration variables, then restores the originals.
fn run_with_env<T, R>(vars: &[(&str, &str)], test: T) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> = CONFIG_VARS
        .iter()
        .map(|&var| (var, env::var(var).ok()))
        .collect();

    unsafe {
        for var in CONFIG_VARS {
            env::remove_var(var);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }
    }

    let result = panic::catch_unwind(test);

    for (key, original_value) in originals.into_iter().rev() {
        unsafe {
            if let Some(val) = original_value {
                env::set_var(key, val);
            } else {
                env::remove_var(key);
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

// --- Tests ---

#[test]
#[serial]
fn test_production_requires_upstream() {
    let result = run_with_env(&[("APP_ENV", "production")], AppConfig::load);
    assert_eq!(result.unwrap_err(), ConfigError::Missing("API_UPSTREAM_URL"));
}

#[test]
#[serial]
fn test_production_defaults() {
    let config = run_with_env(
        &[
            ("APP_ENV", "production"),
            ("API_UPSTREAM_URL", "https://api.example.com"),
        ],
        AppConfig::load,
    )
    .unwrap();

    assert_eq!(config.env, Env::Production);
    assert_eq!(config.api_upstream, "https://api.example.com");
    // Tunnel header is a development aid only.
    assert!(!config.skip_tunnel_warning);
    assert!(config.cookie_secure);
    assert_eq!(config.session_secret, None);
}

#[test]
#[serial]
fn test_local_env_defaults() {
    let config = run_with_env(&[("APP_ENV", "local")], AppConfig::load).unwrap();

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.bind_addr, "0.0.0.0:3000");
    assert_eq!(config.api_upstream, "http://localhost:8080");
    assert_eq!(config.static_dir, "out");
    assert_eq!(config.proxy_timeout_secs, 30);
    assert!(config.skip_tunnel_warning);
    assert!(!config.cookie_secure);
}

#[test]
#[serial]
fn test_overrides_are_read() {
    let config = run_with_env(
        &[
            ("BIND_ADDR", "127.0.0.1:4000"),
            ("STATIC_DIR", "/srv/console"),
            ("SESSION_JWT_SECRET", "s3cret"),
            ("PROXY_SKIP_TUNNEL_WARNING", "off"),
            ("PROXY_TIMEOUT_SECS", "5"),
        ],
        AppConfig::load,
    )
    .unwrap();

    assert_eq!(config.bind_addr, "127.0.0.1:4000");
    assert_eq!(config.static_dir, "/srv/console");
    assert_eq!(config.session_secret.as_deref(), Some("s3cret"));
    assert!(!config.skip_tunnel_warning);
    assert_eq!(config.proxy_timeout_secs, 5);
}

#[test]
#[serial]
fn test_invalid_values_are_rejected() {
    let result = run_with_env(&[("PROXY_TIMEOUT_SECS", "soon")], AppConfig::load);
    assert_eq!(
        result.unwrap_err(),
        ConfigError::Invalid {
            key: "PROXY_TIMEOUT_SECS",
            value: "soon".to_string()
        }
    );

    let result = run_with_env(&[("COOKIE_SECURE", "maybe")], AppConfig::load);
    assert!(matches!(result, Err(ConfigError::Invalid { key: "COOKIE_SECURE", .. })));
}

#[test]
#[serial]
fn test_blank_secret_counts_as_unset() {
    let config = run_with_env(&[("SESSION_JWT_SECRET", "   ")], AppConfig::load).unwrap();
    assert_eq!(config.session_secret, None);
}
