/// HTTP-backed embedding-model client — the external "embedding model binding"
/// named in the core's design. Generates a single operation,
/// `GenerateEmbedding(text) -> [1536]f32`, rate-limited and LRU-cached.
use crate::config::{EmbeddingConfig, EMBEDDING_DIMENSION};
use crate::error::{EmbeddingError, Result};
use async_trait::async_trait;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::Mutex as AsyncMutex;

/// Abstraction over "call an embedding model for some text", so the core crate
/// never depends on a concrete HTTP client or model provider.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Generate a single embedding vector for `text`.
    ///
    /// Implementations reject empty input with [`EmbeddingError::EmptyInput`] and
    /// must return exactly [`EMBEDDING_DIMENSION`] floats.
    async fn generate(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for a batch of texts, preserving order.
    async fn generate_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.generate(text).await?);
        }
        Ok(out)
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponseItem {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingResponseItem>,
}

/// A simple token-bucket limiter bounding outbound requests per second.
///
/// Held behind an async mutex because the worker pool shares one client across
/// concurrently-running workers (spec §5: embedding calls are rate-limited).
struct RateLimiter {
    capacity: f64,
    tokens: Mutex<(f64, Instant)>,
}

impl RateLimiter {
    fn new(per_second: u32) -> Self {
        Self {
            capacity: per_second.max(1) as f64,
            tokens: Mutex::new((per_second.max(1) as f64, Instant::now())),
        }
    }

    async fn acquire(&self) {
        loop {
            let wait = {
                let mut guard = self.tokens.lock().unwrap();
                let (tokens, last) = *guard;
                let elapsed = last.elapsed().as_secs_f64();
                let refilled = (tokens + elapsed * self.capacity).min(self.capacity);
                if refilled >= 1.0 {
                    *guard = (refilled - 1.0, Instant::now());
                    None
                } else {
                    *guard = (refilled, Instant::now());
                    Some(Duration::from_secs_f64((1.0 - refilled) / self.capacity))
                }
            };
            match wait {
                None => return,
                Some(d) => tokio::time::sleep(d).await,
            }
        }
    }
}

/// Reference implementation of [`EmbeddingClient`] that calls an OpenAI-compatible
/// embeddings endpoint over HTTP.
pub struct HttpEmbeddingClient {
    http: reqwest::Client,
    config: EmbeddingConfig,
    limiter: RateLimiter,
    cache: AsyncMutex<LruCache<String, Vec<f32>>>,
}

impl HttpEmbeddingClient {
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        config
            .validate()
            .map_err(EmbeddingError::ConfigError)?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        let limiter = RateLimiter::new(config.requests_per_second);
        let cache_capacity =
            NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::new(1).unwrap());

        Ok(Self {
            http,
            config,
            limiter,
            cache: AsyncMutex::new(LruCache::new(cache_capacity)),
        })
    }

    async fn call_model(&self, text: &str) -> Result<Vec<f32>> {
        self.limiter.acquire().await;

        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&EmbeddingRequest {
                model: &self.config.model_name,
                input: text,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ModelError { status, body });
        }

        let parsed: EmbeddingResponse = response.json().await?;
        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|item| item.embedding)
            .unwrap_or_default();

        if vector.len() != EMBEDDING_DIMENSION {
            return Err(EmbeddingError::WrongDimensions {
                expected: EMBEDDING_DIMENSION,
                actual: vector.len(),
            });
        }

        Ok(vector)
    }
}

#[async_trait]
impl EmbeddingClient for HttpEmbeddingClient {
    async fn generate(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        {
            let mut cache = self.cache.lock().await;
            if let Some(hit) = cache.get(text) {
                return Ok(hit.clone());
            }
        }

        let embedding = self.call_model(text).await?;

        {
            let mut cache = self.cache.lock().await;
            cache.put(text.to_string(), embedding.clone());
        }

        Ok(embedding)
    }
}

/// Deterministic embedding client for tests and offline development: hashes the
/// input into a fixed-dimension vector instead of calling a network model.
pub struct DeterministicEmbeddingClient;

#[async_trait]
impl EmbeddingClient for DeterministicEmbeddingClient {
    async fn generate(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let mut seed: u64 = 1469598103934665603;
        for byte in text.bytes() {
            seed ^= byte as u64;
            seed = seed.wrapping_mul(1099511628211);
        }
        let mut vector = Vec::with_capacity(EMBEDDING_DIMENSION);
        let mut state = seed;
        for _ in 0..EMBEDDING_DIMENSION {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let v = ((state >> 11) as f64 / (1u64 << 53) as f64) as f32;
            vector.push(v * 2.0 - 1.0);
        }
        Ok(vector)
    }
}
