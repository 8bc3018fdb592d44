//! Configuration for the retrieval pipeline
//!
//! Handles chunking parameters, embedding backend selection, and the
//! remote reasoning service credentials.

use crate::error::RagError;

/// Default target characters per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Default overlap between consecutive chunks
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Default number of chunks retrieved per query
pub const DEFAULT_TOP_K: usize = 5;

/// Chunks shorter than this are dropped during ingestion
pub const DEFAULT_MIN_CHUNK_CHARS: usize = 50;

/// Embedding backend options
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// Pretrained sentence-embedding model served by fastembed
    FastEmbed { model: String },
    /// Deterministic token-hash embeddings; no model download required
    Hashed { dimension: usize },
}

impl EmbeddingBackend {
    pub fn fastembed_default() -> Self {
        Self::FastEmbed {
            model: "BAAI/bge-small-en-v1.5".to_string(),
        }
    }

    pub fn hashed_default() -> Self {
        Self::Hashed { dimension: 256 }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct RagConfig {
    /// Target characters per chunk
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per query
    pub top_k: usize,
    /// Minimum chunk length kept during ingestion
    pub min_chunk_chars: usize,
    /// Embedding backend selection
    pub embedding: EmbeddingBackend,
    /// API key for the remote reasoning service; rules-only when absent
    pub openai_api_key: Option<String>,
    /// Chat model used for reasoning
    pub openai_model: String,
    /// Base URL for OpenAI-compatible endpoints
    pub openai_base_url: String,
    /// Timeout for outbound HTTP calls, in seconds
    pub request_timeout_secs: u64,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
            min_chunk_chars: DEFAULT_MIN_CHUNK_CHARS,
            embedding: EmbeddingBackend::fastembed_default(),
            openai_api_key: None,
            openai_model: "gpt-4".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            request_timeout_secs: 60,
        }
    }
}

impl RagConfig {
    /// Load configuration from environment variables.
    ///
    /// Expected variables:
    /// - POLICYQA_CHUNK_SIZE / POLICYQA_CHUNK_OVERLAP / POLICYQA_TOP_K
    /// - POLICYQA_EMBEDDER: "fastembed" (default) or "hashed"
    /// - POLICYQA_EMBEDDING_MODEL: fastembed model code
    /// - OPENAI_API_KEY / OPENAI_MODEL / OPENAI_BASE_URL
    pub fn from_env() -> Result<Self, RagError> {
        let mut config = Self::default();

        if let Some(v) = read_usize("POLICYQA_CHUNK_SIZE")? {
            config.chunk_size = v;
        }
        if let Some(v) = read_usize("POLICYQA_CHUNK_OVERLAP")? {
            config.chunk_overlap = v;
        }
        if let Some(v) = read_usize("POLICYQA_TOP_K")? {
            config.top_k = v;
        }
        if let Some(v) = read_usize("POLICYQA_MIN_CHUNK_CHARS")? {
            config.min_chunk_chars = v;
        }

        let backend = std::env::var("POLICYQA_EMBEDDER")
            .unwrap_or_else(|_| "fastembed".to_string());
        config.embedding = match backend.to_lowercase().as_str() {
            "fastembed" => {
                let model = std::env::var("POLICYQA_EMBEDDING_MODEL")
                    .unwrap_or_else(|_| "BAAI/bge-small-en-v1.5".to_string());
                EmbeddingBackend::FastEmbed { model }
            }
            "hashed" => EmbeddingBackend::hashed_default(),
            other => {
                return Err(RagError::InvalidConfiguration(format!(
                    "unknown embedding backend: {}",
                    other
                )))
            }
        };

        config.openai_api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            config.openai_model = model;
        }
        if let Ok(base) = std::env::var("OPENAI_BASE_URL") {
            config.openai_base_url = base;
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the API key for the remote reasoning service
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.openai_api_key = Some(key.to_string());
        self
    }

    /// Set chunking parameters
    pub fn with_chunking(mut self, chunk_size: usize, chunk_overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.chunk_overlap = chunk_overlap;
        self
    }

    /// Set the retrieval depth
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Check structural invariants of the configuration.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.chunk_size == 0 {
            return Err(RagError::InvalidConfiguration(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::InvalidConfiguration(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::InvalidConfiguration(
                "top_k must be at least 1".to_string(),
            ));
        }
        if let EmbeddingBackend::Hashed { dimension } = &self.embedding {
            if *dimension == 0 {
                return Err(RagError::InvalidConfiguration(
                    "embedding dimension must be greater than zero".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn read_usize(name: &str) -> Result<Option<usize>, RagError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<usize>()
            .map(Some)
            .map_err(|_| RagError::InvalidConfiguration(format!("{} must be an integer", name))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(RagConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let config = RagConfig::default().with_top_k(0);
        assert!(matches!(
            config.validate(),
            Err(RagError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        let config = RagConfig::default().with_chunking(100, 100);
        assert!(config.validate().is_err());

        let config = RagConfig::default().with_chunking(100, 99);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let config = RagConfig::default().with_chunking(0, 0);
        assert!(config.validate().is_err());
    }
}
