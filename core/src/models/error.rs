//! Validation errors for domain entities.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid knowledge type: {0}")]
    InvalidKnowledgeType(String),

    #[error("invalid knowledge status: {0}")]
    InvalidKnowledgeStatus(String),

    #[error("invalid id format: {0}")]
    InvalidId(String),

    #[error("invalid API key token format")]
    InvalidTokenFormat,

    #[error("invalid scope path: {0}")]
    InvalidScope(String),
}
