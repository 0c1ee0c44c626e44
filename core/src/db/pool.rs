//! Database Connection Management
//!
//! Thin wrapper around a Postgres connection pool plus the transaction-scoped
//! repository bundle described in spec §9: a `with_tx` runner that commits on
//! success and rolls back on any error, so the versioned write path can bind
//! the knowledge row, its version row, and its embedding job to one transaction.

use std::future::Future;
use std::time::Duration;

use futures::future::BoxFuture;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

use super::error::DatabaseError;

/// Database service for managing the Postgres connection pool and migrations.
#[derive(Debug, Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    /// Connect to `database_url`, applying any pending migrations under
    /// `core/migrations/` before returning.
    pub async fn connect(database_url: &str) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await
            .map_err(DatabaseError::ConnectionFailed)?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Wrap an already-open pool (used by tests that share one pool across
    /// many cases).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run `f` inside a single transaction. Commits on `Ok`, rolls back on
    /// `Err`. This is the "transaction-scoped repository bundle" runner: every
    /// store function in [`crate::db`] accepts any `impl sqlx::PgExecutor`, so
    /// a `&mut Transaction<'_, Postgres>` can be passed directly to bind
    /// several store calls to the same transaction.
    pub async fn with_tx<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: for<'c> FnOnce(&'c mut Transaction<'_, Postgres>) -> BoxFuture<'c, Result<T, DatabaseError>>,
    {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(DatabaseError::QueryFailed)?;

        match f(&mut tx).await {
            Ok(value) => {
                tx.commit().await.map_err(DatabaseError::QueryFailed)?;
                Ok(value)
            }
            Err(err) => {
                let _ = tx.rollback().await;
                Err(err)
            }
        }
    }
}

/// Helper so callers can write `with_tx(|tx| box_fut(async move { ... }))`
/// without spelling out the `BoxFuture` type at each call site.
pub fn box_fut<'a, T>(fut: impl Future<Output = Result<T, DatabaseError>> + Send + 'a) -> BoxFuture<'a, Result<T, DatabaseError>> {
    Box::pin(fut)
}
