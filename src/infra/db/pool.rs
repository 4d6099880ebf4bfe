//! One-time construction and teardown of the relational pool.
//!
//! Concurrent first callers race on a `OnceCell`; exactly one pool is
//! built and every caller observes the same instance. Configuration is
//! consulted only on first construction. `close` is idempotent, is a
//! no-op when the pool was never built, and leaves the manager
//! permanently unusable.

use std::sync::atomic::{AtomicBool, Ordering};

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::DatabaseSettings;
use crate::infra::error::InfraError;

#[derive(Default)]
pub struct PoolManager {
    pool: OnceCell<PgPool>,
    closed: AtomicBool,
}

impl PoolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the shared pool, constructing it on first call.
    ///
    /// Fails fatally when the store is unreachable; no partial pool is
    /// ever returned.
    pub async fn acquire(&self, settings: &DatabaseSettings) -> Result<PgPool, InfraError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(InfraError::database(
                "relational pool manager has been shut down",
            ));
        }

        let pool = self.pool.get_or_try_init(|| connect(settings)).await?;

        // A close racing this first construction sees an empty cell and
        // skips the teardown; re-check so the fresh pool is not handed
        // out (or left open) past shutdown.
        if self.closed.load(Ordering::Acquire) {
            pool.close().await;
            return Err(InfraError::database(
                "relational pool manager has been shut down",
            ));
        }
        Ok(pool.clone())
    }

    /// Release all pooled connections. Safe to call repeatedly and
    /// before any pool was built.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(pool) = self.pool.get() {
            pool.close().await;
            info!("relational pool closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

async fn connect(settings: &DatabaseSettings) -> Result<PgPool, InfraError> {
    let mut options: PgConnectOptions = settings.url.parse().map_err(|err| {
        InfraError::configuration(format!("invalid database url: {err}"))
    })?;
    if let Some(username) = settings.username.as_deref() {
        options = options.username(username);
    }
    if let Some(password) = settings.password.as_deref() {
        options = options.password(password);
    }

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections.get())
        .min_connections(settings.min_connections)
        .idle_timeout(settings.idle_timeout)
        .max_lifetime(settings.max_lifetime)
        .acquire_timeout(settings.acquire_timeout)
        .connect_with(options)
        .await
        .map_err(|err| InfraError::database(format!("failed to construct pool: {err}")))?;

    info!(
        max_connections = settings.max_connections.get(),
        min_connections = settings.min_connections,
        "relational pool constructed"
    );
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseSettings;

    fn unreachable_settings() -> DatabaseSettings {
        DatabaseSettings {
            // Port 9 (discard) is never a Postgres listener.
            url: "postgres://127.0.0.1:9/vellum".to_string(),
            username: None,
            password: None,
            max_connections: std::num::NonZeroU32::new(2).expect("non-zero"),
            min_connections: 0,
            idle_timeout: std::time::Duration::from_secs(600),
            max_lifetime: std::time::Duration::from_secs(1800),
            acquire_timeout: std::time::Duration::from_millis(500),
        }
    }

    #[tokio::test]
    async fn close_before_construction_is_a_noop() {
        let manager = PoolManager::new();
        manager.close().await;
        assert!(manager.is_closed());

        // Closing again is fine too.
        manager.close().await;
    }

    #[tokio::test]
    async fn acquire_after_close_is_refused() {
        let manager = PoolManager::new();
        manager.close().await;

        let err = manager
            .acquire(&unreachable_settings())
            .await
            .expect_err("closed manager must refuse acquisition");
        assert!(matches!(err, InfraError::Database { .. }));
    }

    #[tokio::test]
    async fn unreachable_store_fails_construction() {
        let manager = PoolManager::new();
        let err = manager
            .acquire(&unreachable_settings())
            .await
            .expect_err("nothing listens on the discard port");
        assert!(matches!(err, InfraError::Database { .. }));
    }

    #[tokio::test]
    async fn malformed_url_is_a_configuration_error() {
        let manager = PoolManager::new();
        let mut settings = unreachable_settings();
        settings.url = "not a url".to_string();

        let err = manager
            .acquire(&settings)
            .await
            .expect_err("url cannot parse");
        assert!(matches!(err, InfraError::Configuration { .. }));
    }
}
