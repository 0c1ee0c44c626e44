//! Database Error Types
//!
//! Covers connection, migration, and query failures. Service-layer errors in
//! [`crate::services::error`] wrap these with business context.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a connection pool.
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(#[source] sqlx::Error),

    /// Failed to run pending migrations.
    #[error("failed to run migrations: {0}")]
    MigrationFailed(#[from] sqlx::migrate::MigrateError),

    /// A query or transaction failed.
    #[error("database operation failed: {0}")]
    QueryFailed(#[from] sqlx::Error),

    /// A row existed but failed to decode into its domain type.
    #[error("failed to decode row: {0}")]
    DecodeFailed(String),
}

impl DatabaseError {
    pub fn decode_failed(msg: impl Into<String>) -> Self {
        Self::DecodeFailed(msg.into())
    }

    /// Whether the underlying error is a unique-constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::QueryFailed(sqlx::Error::Database(db_err)) => {
                db_err.is_unique_violation()
            }
            _ => false,
        }
    }
}
