//! Error types for the embedding-model client boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// The model binding rejected empty input text.
    #[error("embedding input text is empty")]
    EmptyInput,

    /// The model returned a vector of the wrong length.
    #[error("wrong embedding dimensions: expected {expected}, got {actual}")]
    WrongDimensions { expected: usize, actual: usize },

    /// The HTTP call to the embedding model failed.
    #[error("embedding model request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The embedding model returned a non-success status.
    #[error("embedding model returned status {status}: {body}")]
    ModelError { status: u16, body: String },

    /// Invalid client configuration.
    #[error("invalid embedding client configuration: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, EmbeddingError>;
