//! Connection pool registry.
//!
//! The registry owns a mapping from pool name to `PgPool` and is an explicit
//! dependency of everything that needs a connection; there is no ambient
//! global state. Pools are created lazily (`connect_lazy_with`), matching
//! the driver's own deferred connection behavior: a pool handle exists
//! immediately and configuration problems surface at first query, so a
//! failed connection never leaves a half-registered handle behind.

use crate::config::ConnectionSettings;
use crate::error::{SqlError, SqlResult};
use serde_json::{Value as JsonValue, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Name used when a caller does not supply one.
pub const DEFAULT_CONNECTION: &str = "default";

/// An injected debug sink for pre-execution diagnostics.
///
/// Implementations must not fail; payloads are structured JSON. Absence of a
/// sink is legal and all logging is skipped silently.
pub trait DebugSink: Send + Sync {
    fn debug(&self, payload: &JsonValue);
}

/// A [`DebugSink`] forwarding to `tracing::debug!`.
pub struct TracingSink;

impl DebugSink for TracingSink {
    fn debug(&self, payload: &JsonValue) {
        debug!(payload = %payload, "sqlkit");
    }
}

/// Registry of named connection pools.
///
/// At most one live pool exists per name, enforced atomically: concurrent
/// `get_or_create` calls for an absent name re-check under the write lock,
/// so exactly one pool is created and all callers receive it.
pub struct ConnectionRegistry {
    pools: RwLock<HashMap<String, PgPool>>,
    sink: Option<Arc<dyn DebugSink>>,
}

impl ConnectionRegistry {
    /// Create a registry with no debug sink.
    pub fn new() -> Self {
        Self {
            pools: RwLock::new(HashMap::new()),
            sink: None,
        }
    }

    /// Create a registry with an injected debug sink.
    pub fn with_debug_sink(sink: Arc<dyn DebugSink>) -> Self {
        Self {
            pools: RwLock::new(HashMap::new()),
            sink: Some(sink),
        }
    }

    /// Emit a debug payload to the injected sink, if any.
    pub(crate) fn debug(&self, payload: &JsonValue) {
        if let Some(sink) = &self.sink {
            sink.debug(payload);
        }
    }

    /// Get the pool registered under `name`, creating it if absent.
    ///
    /// `name` defaults to [`DEFAULT_CONNECTION`]. On a cache hit the
    /// existing pool is returned unchanged and `settings` is **ignored**,
    /// even if it differs from what the pool was created with. That quirk is
    /// part of the contract: the first creation wins, and reconfiguring a
    /// name requires closing it first.
    ///
    /// On a miss, `settings` is used when given, otherwise resolved from
    /// the environment ([`ConnectionSettings::from_env`]).
    pub async fn get_or_create(
        &self,
        settings: Option<ConnectionSettings>,
        name: Option<&str>,
    ) -> SqlResult<PgPool> {
        let name = name.unwrap_or(DEFAULT_CONNECTION);

        {
            let pools = self.pools.read().await;
            if let Some(pool) = pools.get(name) {
                return Ok(pool.clone());
            }
        }

        let mut pools = self.pools.write().await;
        // Re-check: another task may have created the pool between the read
        // and write lock, and "at most one pool per name" must hold.
        if let Some(pool) = pools.get(name) {
            return Ok(pool.clone());
        }

        let settings = settings.unwrap_or_else(ConnectionSettings::from_env);
        self.debug(&json!({
            "message": "creating connection pool",
            "name": name,
            "config": &settings,
        }));
        info!(name = %name, host = %settings.host, port = settings.port, "Creating connection pool");

        let pool = PgPoolOptions::new()
            .max_connections(settings.pool.max_connections_or_default())
            .min_connections(settings.pool.min_connections_or_default())
            .acquire_timeout(settings.pool.acquire_timeout_or_default())
            .idle_timeout(settings.pool.idle_timeout_or_default())
            .connect_lazy_with(settings.connect_options());

        pools.insert(name.to_string(), pool.clone());
        Ok(pool)
    }

    /// Gracefully close the pool registered under `name` and evict it.
    ///
    /// `name` defaults to [`DEFAULT_CONNECTION`]. Closing a name with no
    /// pool fails with [`SqlError::ConnectionNotFound`]; the registry is
    /// left untouched in that case.
    pub async fn close(&self, name: Option<&str>) -> SqlResult<()> {
        let name = name.unwrap_or(DEFAULT_CONNECTION);
        let pool = {
            let mut pools = self.pools.write().await;
            pools
                .remove(name)
                .ok_or_else(|| SqlError::connection_not_found(name))?
        };
        info!(name = %name, "Closing connection pool");
        pool.close().await;
        Ok(())
    }

    /// Check if a pool is registered under `name`.
    pub async fn contains(&self, name: &str) -> bool {
        let pools = self.pools.read().await;
        pools.contains_key(name)
    }

    /// Get the number of registered pools.
    pub async fn pool_count(&self) -> usize {
        let pools = self.pools.read().await;
        pools.len()
    }

    /// Close every registered pool and clear the registry.
    pub async fn close_all(&self) {
        let drained: Vec<(String, PgPool)> = {
            let mut pools = self.pools.write().await;
            pools.drain().collect()
        };
        for (name, pool) in drained {
            info!(name = %name, "Closing connection pool");
            pool.close().await;
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
