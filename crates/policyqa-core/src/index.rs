//! In-memory chunk index and cosine-similarity ranking.
//!
//! The index is built once per document and read many times. Chunks and
//! embeddings are stored in the same order, so a score position maps back
//! to its source chunk without a join key.

use serde::Serialize;

use crate::document::DocumentChunk;
use crate::error::RagError;

/// A retrieved chunk with its similarity score
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// Brute-force vector index over one document's chunks
#[derive(Debug)]
pub struct ChunkIndex {
    chunks: Vec<DocumentChunk>,
    embeddings: Vec<Vec<f32>>,
    dimension: usize,
    source: String,
}

impl ChunkIndex {
    /// Build an index from chunks and their embeddings.
    ///
    /// The two sequences must have the same length and every embedding the
    /// same dimension.
    pub fn build(
        source: &str,
        chunks: Vec<DocumentChunk>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<Self, RagError> {
        if chunks.len() != embeddings.len() {
            return Err(RagError::Embedding(format!(
                "chunk/embedding count mismatch: {} chunks, {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let dimension = embeddings.first().map(|e| e.len()).unwrap_or(0);
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dimension) {
            return Err(RagError::Embedding(format!(
                "inconsistent embedding dimension: expected {}, got {}",
                dimension,
                bad.len()
            )));
        }

        Ok(Self {
            chunks,
            embeddings,
            dimension,
            source: source.to_string(),
        })
    }

    /// Rank all chunks against the query vector and return the top `k`.
    ///
    /// Results are sorted by descending similarity; ties keep original
    /// chunk order. Returns `min(k, len)` results.
    pub fn top_k(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>, RagError> {
        if k == 0 {
            return Err(RagError::InvalidConfiguration(
                "top_k must be at least 1".to_string(),
            ));
        }
        if !self.chunks.is_empty() && query.len() != self.dimension {
            return Err(RagError::Embedding(format!(
                "query dimension {} does not match index dimension {}",
                query.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .embeddings
            .iter()
            .map(|e| cosine_similarity(query, e))
            .enumerate()
            .collect();

        // Stable sort keeps original chunk order on equal scores
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(idx, score)| ScoredChunk {
                chunk: self.chunks[idx].clone(),
                score,
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Highest page number seen across chunks
    pub fn page_count(&self) -> u32 {
        self.chunks.iter().map(|c| c.page).max().unwrap_or(0)
    }
}

/// Cosine similarity between two vectors.
///
/// A zero vector on either side yields 0.0 rather than dividing by zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
