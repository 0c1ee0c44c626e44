/// Nectra NLP Engine - embedding-model client boundary
///
/// This crate is the external "embedding model binding" the core design calls out:
/// a single operation, `GenerateEmbedding(text) -> [1536]f32`, behind the
/// [`EmbeddingClient`] trait. The reference adapter calls an OpenAI-compatible HTTP
/// endpoint; a deterministic in-memory adapter is provided for tests.
///
/// # Example
///
/// ```ignore
/// use nectra_nlp_engine::{EmbeddingClient, EmbeddingConfig, HttpEmbeddingClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = HttpEmbeddingClient::new(EmbeddingConfig::from_env())?;
///     let embedding = client.generate("Hello, world!").await?;
///     println!("Generated embedding with {} dimensions", embedding.len());
///     Ok(())
/// }
/// ```
pub mod config;
pub mod embedding;
pub mod error;

// Re-export main types
pub use config::{EmbeddingConfig, EMBEDDING_DIMENSION};
pub use embedding::{DeterministicEmbeddingClient, EmbeddingClient, HttpEmbeddingClient};
pub use error::{EmbeddingError, Result};
