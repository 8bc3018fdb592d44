//! Embedding backends.
//!
//! Two implementations sit behind the [`Embedder`] trait: a pretrained
//! sentence-embedding model served by fastembed, and a deterministic
//! token-hash embedder that needs no model download. Batch output order
//! always matches input order, which the index relies on.

use std::hash::{Hash, Hasher};
use std::str::FromStr;

use ahash::AHasher;
use fastembed::{EmbeddingModel, TextEmbedding, TextInitOptions};
use parking_lot::Mutex;

use crate::config::{EmbeddingBackend, RagConfig};
use crate::error::RagError;

/// Maps texts to fixed-length vectors
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts; output order matches input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, RagError>;

    /// Length of every vector this embedder produces
    fn dimension(&self) -> usize;

    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let mut vectors = self.embed_batch(&[text])?;
        vectors
            .pop()
            .ok_or_else(|| RagError::Embedding("embedder returned no vector".to_string()))
    }
}

/// Build the embedder selected by configuration.
pub fn from_config(config: &RagConfig) -> Result<Box<dyn Embedder>, RagError> {
    match &config.embedding {
        EmbeddingBackend::FastEmbed { model } => Ok(Box::new(FastEmbedder::try_new(model)?)),
        EmbeddingBackend::Hashed { dimension } => Ok(Box::new(HashEmbedder::new(*dimension))),
    }
}

/// Sentence-embedding backend using fastembed.
///
/// The loaded model sits behind a mutex so it can be shared without
/// cloning heavyweight resources.
pub struct FastEmbedder {
    dimension: usize,
    inner: Mutex<TextEmbedding>,
}

impl FastEmbedder {
    /// Load the model identified by its code, for example
    /// `BAAI/bge-small-en-v1.5`.
    pub fn try_new(model_name: &str) -> Result<Self, RagError> {
        let label = model_name.trim();
        if label.is_empty() {
            return Err(RagError::InvalidConfiguration(
                "embedding model name cannot be empty".to_string(),
            ));
        }

        let model = EmbeddingModel::from_str(label).map_err(|err| {
            RagError::InvalidConfiguration(format!(
                "unknown embedding model `{}`: {}",
                label, err
            ))
        })?;

        let info = TextEmbedding::get_model_info(&model).map_err(|err| {
            RagError::Embedding(format!("no metadata for model `{}`: {}", label, err))
        })?;
        let dimension = info.dim;

        tracing::info!(model = label, dimension, "loading embedding model");
        let inner = TextEmbedding::try_new(TextInitOptions::new(model.clone())).map_err(|err| {
            RagError::Embedding(format!("failed to initialise model `{}`: {}", label, err))
        })?;

        Ok(Self {
            dimension,
            inner: Mutex::new(inner),
        })
    }
}

impl Embedder for FastEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, RagError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut model = self.inner.lock();
        let vectors = model
            .embed(texts.to_vec(), None)
            .map_err(|err| RagError::Embedding(format!("inference failed: {}", err)))?;

        if vectors.len() != texts.len() {
            return Err(RagError::Embedding(format!(
                "expected {} vectors, model returned {}",
                texts.len(),
                vectors.len()
            )));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(RagError::Embedding(format!(
                "unexpected embedding dimension (expected {}, got {})",
                self.dimension,
                bad.len()
            )));
        }

        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Deterministic embedder that hashes tokens into a fixed-size vector.
///
/// Not a substitute for semantic embeddings, but it keeps the pipeline
/// functional offline and gives tests reproducible vectors. Vectors are
/// L2-normalized; text with no tokens maps to the zero vector.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.clamp(8, 4096),
        }
    }

    fn tokenize<'a>(&self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        text.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
            .filter(|token| !token.is_empty())
            .map(|token| token.to_lowercase())
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in self.tokenize(text) {
            let mut hasher = AHasher::default();
            token.hash(&mut hasher);
            let idx = (hasher.finish() as usize) % self.dimension;
            vector[idx] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Embedder for HashEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, RagError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
