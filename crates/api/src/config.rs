//! Application configuration loaded from environment variables.

use std::time::Duration;

use reservation::{EngineConfig, HookMode};
use thiserror::Error;

/// Errors from malformed configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable was set but could not be parsed.
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `json` for JSON log lines, anything else for plain text
/// - `DATABASE_URL`: PostgreSQL connection string; in-memory store when unset
/// - `DB_MAX_CONNECTIONS`: pool size (default: `10`)
/// - `LOCK_TIMEOUT_MS`: row lock wait in milliseconds (default: `5000`)
/// - `HOOK_MODE`: `in_transaction` (default) or `after_commit`
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub json_logs: bool,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub lock_timeout: Duration,
    pub hook_mode: HookMode,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    ///
    /// Unparseable numeric values fall back to defaults; an unknown
    /// `HOOK_MODE` is an error since it changes failure semantics.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let hook_mode = match lookup("HOOK_MODE") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "HOOK_MODE",
                value,
            })?,
            None => defaults.hook_mode,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            json_logs: lookup("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|n| n.parse().ok())
                .unwrap_or(defaults.db_max_connections),
            lock_timeout: lookup("LOCK_TIMEOUT_MS")
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.lock_timeout),
            hook_mode,
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the engine settings derived from this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_lock_timeout(self.lock_timeout)
            .with_hook_mode(self.hook_mode)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            json_logs: false,
            database_url: None,
            db_max_connections: 10,
            lock_timeout: seat_store::DEFAULT_LOCK_TIMEOUT,
            hook_mode: HookMode::default(),
        }
    }
}
