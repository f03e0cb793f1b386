//! Connection configuration.
//!
//! Settings for a pool are given explicitly or resolved from environment
//! variables (`DB_HOST`, `DB_USER`, `DB_PASSWORD`, `DB_DATABASE`, `DB_PORT`)
//! when the registry is asked to create a pool without an explicit config.

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnectOptions;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5432;

pub const ENV_HOST: &str = "DB_HOST";
pub const ENV_USER: &str = "DB_USER";
pub const ENV_PASSWORD: &str = "DB_PASSWORD";
pub const ENV_DATABASE: &str = "DB_DATABASE";
pub const ENV_PORT: &str = "DB_PORT";

// Pool configuration defaults
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_MIN_CONNECTIONS: u32 = 1;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Connection pool sizing and timeout options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolSettings {
    /// Maximum connections in the pool (default: 10)
    pub max_connections: Option<u32>,
    /// Minimum connections in the pool (default: 1)
    pub min_connections: Option<u32>,
    /// Idle timeout in seconds (default: 600)
    pub idle_timeout_secs: Option<u64>,
    /// Connection acquire timeout in seconds (default: 30)
    pub acquire_timeout_secs: Option<u64>,
}

impl PoolSettings {
    /// Get max_connections with default value.
    pub fn max_connections_or_default(&self) -> u32 {
        self.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS)
    }

    /// Get min_connections with default value.
    pub fn min_connections_or_default(&self) -> u32 {
        self.min_connections.unwrap_or(DEFAULT_MIN_CONNECTIONS)
    }

    /// Get idle_timeout with default value.
    pub fn idle_timeout_or_default(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs.unwrap_or(DEFAULT_IDLE_TIMEOUT_SECS))
    }

    /// Get acquire_timeout with default value.
    pub fn acquire_timeout_or_default(&self) -> Duration {
        Duration::from_secs(
            self.acquire_timeout_secs
                .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_SECS),
        )
    }
}

/// Settings for one PostgreSQL connection pool.
///
/// Immutable once handed to pool creation. The password is never serialized,
/// so debug payloads built from these settings carry no credential material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    /// Contains sensitive data - never log
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub database: Option<String>,
    #[serde(default)]
    pub pool: PoolSettings,
}

impl ConnectionSettings {
    /// Create settings with the given credentials and the default port.
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            user: Some(user.into()),
            password: Some(password.into()),
            database: Some(database.into()),
            pool: PoolSettings::default(),
        }
    }

    /// Set a non-default port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set pool sizing options.
    pub fn with_pool(mut self, pool: PoolSettings) -> Self {
        self.pool = pool;
        self
    }

    /// Resolve settings from the process environment.
    ///
    /// `DB_HOST` falls back to `127.0.0.1` and `DB_PORT` to `5432`
    /// (unparseable ports also fall back); user, password and database are
    /// taken as-is when present and left to the driver's own defaults
    /// otherwise.
    pub fn from_env() -> Self {
        let port = std::env::var(ENV_PORT)
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        Self {
            host: std::env::var(ENV_HOST).unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port,
            user: std::env::var(ENV_USER).ok(),
            password: std::env::var(ENV_PASSWORD).ok(),
            database: std::env::var(ENV_DATABASE).ok(),
            pool: PoolSettings::default(),
        }
    }

    /// Build the driver-level connect options for these settings.
    pub fn connect_options(&self) -> PgConnectOptions {
        let mut options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port);
        if let Some(user) = &self.user {
            options = options.username(user);
        }
        if let Some(password) = &self.password {
            options = options.password(password);
        }
        if let Some(database) = &self.database {
            options = options.database(database);
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_settings_defaults() {
        let pool = PoolSettings::default();
        assert_eq!(pool.max_connections_or_default(), DEFAULT_MAX_CONNECTIONS);
        assert_eq!(pool.min_connections_or_default(), DEFAULT_MIN_CONNECTIONS);
        assert_eq!(
            pool.acquire_timeout_or_default(),
            Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_pool_settings_overrides() {
        let pool = PoolSettings {
            max_connections: Some(2),
            idle_timeout_secs: Some(5),
            ..Default::default()
        };
        assert_eq!(pool.max_connections_or_default(), 2);
        assert_eq!(pool.idle_timeout_or_default(), Duration::from_secs(5));
    }

    #[test]
    fn test_settings_builder() {
        let settings =
            ConnectionSettings::new("localhost", "postgres", "postgres", "postgres").with_port(5433);
        assert_eq!(settings.host, "localhost");
        assert_eq!(settings.port, 5433);
        assert_eq!(settings.database.as_deref(), Some("postgres"));
    }

    #[test]
    fn test_from_env_resolution() {
        // Sole test touching the DB_* variables, so the process-wide env
        // mutation stays serial.
        unsafe {
            std::env::set_var(ENV_HOST, "envhost");
            std::env::set_var(ENV_PORT, "5433");
            std::env::set_var(ENV_USER, "envuser");
        }
        let settings = ConnectionSettings::from_env();
        assert_eq!(settings.host, "envhost");
        assert_eq!(settings.port, 5433);
        assert_eq!(settings.user.as_deref(), Some("envuser"));

        // An unparseable port falls back to the default.
        unsafe {
            std::env::set_var(ENV_PORT, "not-a-port");
        }
        assert_eq!(ConnectionSettings::from_env().port, DEFAULT_PORT);

        unsafe {
            std::env::remove_var(ENV_HOST);
            std::env::remove_var(ENV_PORT);
            std::env::remove_var(ENV_USER);
        }
        let settings = ConnectionSettings::from_env();
        assert_eq!(settings.host, DEFAULT_HOST);
        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(settings.user, None);
    }

    #[test]
    fn test_password_is_not_serialized() {
        let settings = ConnectionSettings::new("localhost", "u", "secret", "db");
        let json = serde_json::to_value(&settings).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["user"], "u");
    }
}
