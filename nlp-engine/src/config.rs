/// Configuration for the embedding-model client
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed output dimension of the embedding model binding.
pub const EMBEDDING_DIMENSION: usize = 1536;

/// Configuration for the HTTP embedding client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of the embedding model endpoint.
    pub endpoint: String,

    /// Bearer token used to authenticate against the endpoint.
    pub api_key: String,

    /// Model identifier sent with each request.
    pub model_name: String,

    /// Per-call timeout in milliseconds.
    pub timeout_ms: u64,

    /// Maximum requests per second the client will issue (token-bucket rate limit).
    pub requests_per_second: u32,

    /// Maximum number of query embeddings to keep in the LRU cache.
    pub cache_capacity: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8081/v1/embeddings".to_string(),
            api_key: String::new(),
            model_name: "text-embedding-3-large".to_string(),
            timeout_ms: 30_000,
            requests_per_second: 10,
            cache_capacity: 10_000,
        }
    }
}

impl EmbeddingConfig {
    /// Build an `EmbeddingConfig` from environment variables, falling back to defaults
    /// for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint: std::env::var("NECTRA_EMBEDDING_ENDPOINT").unwrap_or(defaults.endpoint),
            api_key: std::env::var("NECTRA_EMBEDDING_API_KEY").unwrap_or(defaults.api_key),
            model_name: std::env::var("NECTRA_EMBEDDING_MODEL").unwrap_or(defaults.model_name),
            timeout_ms: std::env::var("NECTRA_EMBEDDING_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_ms),
            requests_per_second: std::env::var("NECTRA_EMBEDDING_RPS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.requests_per_second),
            cache_capacity: std::env::var("NECTRA_EMBEDDING_CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_capacity),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.is_empty() {
            return Err("endpoint cannot be empty".to_string());
        }

        if self.model_name.is_empty() {
            return Err("model_name cannot be empty".to_string());
        }

        if self.timeout_ms == 0 {
            return Err("timeout_ms must be greater than 0".to_string());
        }

        if self.requests_per_second == 0 {
            return Err("requests_per_second must be greater than 0".to_string());
        }

        if self.cache_capacity == 0 {
            return Err("cache_capacity must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.model_name, "text-embedding-3-large");
        assert_eq!(config.timeout_ms, 30_000);
        assert_eq!(config.requests_per_second, 10);
        assert_eq!(config.cache_capacity, 10_000);
    }

    #[test]
    fn test_config_validation() {
        let mut config = EmbeddingConfig::default();

        assert!(config.validate().is_ok());

        config.endpoint = String::new();
        assert!(config.validate().is_err());

        config.endpoint = "http://localhost".to_string();
        config.model_name = String::new();
        assert!(config.validate().is_err());

        config.model_name = "test".to_string();
        config.timeout_ms = 0;
        assert!(config.validate().is_err());

        config.timeout_ms = 1000;
        config.requests_per_second = 0;
        assert!(config.validate().is_err());

        config.requests_per_second = 10;
        config.cache_capacity = 0;
        assert!(config.validate().is_err());
    }
}
