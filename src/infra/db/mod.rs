//! Postgres-backed repository implementations.

mod posts;
pub mod pool;
mod tags;
mod users;
mod util;

pub use pool::PoolManager;
pub use util::map_sqlx_error;

use sqlx::postgres::PgPool;
use sqlx::query;

/// Repository facade over the shared relational pool.
///
/// Post, user and tag repositories are trait impls on this one handle;
/// every query borrows a connection from the pool for exactly the span
/// of the call, so cancellation or an error return releases the lease.
#[derive(Clone)]
pub struct PostgresRepositories {
    pool: PgPool,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }
}
