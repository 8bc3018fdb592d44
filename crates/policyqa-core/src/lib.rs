//! policyqa-core - Retrieval pipeline for policy document question answering
//!
//! This crate provides:
//! - PDF text extraction (per page, with section heading detection)
//! - Fixed-size overlapping chunking
//! - Embedding backends (fastembed model or deterministic token hashing)
//! - In-memory cosine-similarity ranking
//! - Answer generation (remote LLM with rule-based fallback)
//! - Configuration and typed errors

pub mod answer;
pub mod chunker;
pub mod config;
pub mod document;
pub mod embeddings;
pub mod error;
pub mod extract;
pub mod index;
pub mod pipeline;

// Re-export commonly used types
pub use answer::{AnswerEngine, Answerer, OpenAiAnswerer, RuleBasedAnswerer};
pub use config::{EmbeddingBackend, RagConfig};
pub use document::{ClauseRef, ClauseSource, Decision, DocumentChunk, QueryResult};
pub use embeddings::{Embedder, FastEmbedder, HashEmbedder};
pub use error::{RagError, ReasoningError};
pub use extract::DocumentSource;
pub use index::{ChunkIndex, ScoredChunk};
pub use pipeline::RagPipeline;
