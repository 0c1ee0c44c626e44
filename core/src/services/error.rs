//! Service Layer Error Types
//!
//! The taxonomy a transport maps to HTTP status codes (spec §7): each variant is
//! either fatal-and-not-retried (`Validation`, `NotFound`, `AlreadyExists`,
//! `Unauthorized`, `Forbidden`, `InvalidOperation`) or retryable (`Internal`,
//! `StorageOperationFail`).

use crate::db::DatabaseError;
use crate::models::ValidationError;
use nectra_nlp_engine::EmbeddingError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Missing required field, invalid enum, bad token format.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Entity not present.
    #[error("not found: {0}")]
    NotFound(String),

    /// Unique constraint violation on create.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Invalid or missing API key.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Valid credential, insufficient privilege.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Semantic rule violation, e.g. mutating deprecated knowledge.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Unexpected persistence or external failure. May be retried by the caller.
    #[error("internal error: {0}")]
    Internal(String),

    /// Object-store failure. Rolled back in the write path; logged and
    /// best-effort in cleanup paths.
    #[error("storage operation failed: {0}")]
    StorageOperationFail(String),

    /// The request's cancellation token fired before completion.
    #[error("request cancelled")]
    Cancelled,
}

impl CoreError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageOperationFail(msg.into())
    }
}

impl From<DatabaseError> for CoreError {
    fn from(err: DatabaseError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<EmbeddingError> for CoreError {
    fn from(err: EmbeddingError) -> Self {
        Self::Internal(format!("embedding client: {err}"))
    }
}
