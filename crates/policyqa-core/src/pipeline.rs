//! End-to-end pipeline: extract, chunk, embed, rank, answer.

use crate::answer::AnswerEngine;
use crate::config::RagConfig;
use crate::document::QueryResult;
use crate::embeddings::{self, Embedder};
use crate::error::RagError;
use crate::extract::{extract_chunks, fetch_document, DocumentSource};
use crate::index::{ChunkIndex, ScoredChunk};

/// Orchestrates one document's retrieval lifecycle.
///
/// The pipeline itself is stateless across documents; indexes are owned by
/// the caller, which may cache them per source.
pub struct RagPipeline {
    config: RagConfig,
    embedder: Box<dyn Embedder>,
    answerer: AnswerEngine,
}

impl RagPipeline {
    /// Build a pipeline from configuration.
    pub fn new(config: RagConfig) -> Result<Self, RagError> {
        config.validate()?;
        let embedder = embeddings::from_config(&config)?;
        let answerer = AnswerEngine::from_config(&config)?;
        Ok(Self {
            config,
            embedder,
            answerer,
        })
    }

    /// Build a pipeline with injected components.
    pub fn with_components(
        config: RagConfig,
        embedder: Box<dyn Embedder>,
        answerer: AnswerEngine,
    ) -> Result<Self, RagError> {
        config.validate()?;
        Ok(Self {
            config,
            embedder,
            answerer,
        })
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Fetch a document, extract its text, and build the chunk index.
    pub async fn process_document(&self, source: &DocumentSource) -> Result<ChunkIndex, RagError> {
        let bytes = fetch_document(source, self.config.request_timeout_secs).await?;
        let chunks = extract_chunks(&bytes, &source.filename(), &self.config)?;

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts)?;

        ChunkIndex::build(&source.key(), chunks, embeddings)
    }

    /// Rank the index against a query and return the top hits.
    pub fn retrieve(
        &self,
        index: &ChunkIndex,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<Vec<ScoredChunk>, RagError> {
        if query.trim().is_empty() {
            return Err(RagError::InvalidRequest("query cannot be empty".to_string()));
        }

        let k = top_k.unwrap_or(self.config.top_k);
        let query_embedding = self.embedder.embed(query)?;
        let hits = index.top_k(&query_embedding, k)?;

        for hit in &hits {
            tracing::debug!(chunk = %hit.chunk.id(), score = hit.score, "retrieved chunk");
        }
        Ok(hits)
    }

    /// Answer one query against a processed document.
    pub async fn query(
        &self,
        index: &ChunkIndex,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<QueryResult, RagError> {
        let hits = self.retrieve(index, query, top_k)?;
        let result = self.answerer.answer(query, &hits).await;

        tracing::info!(
            query,
            decision = ?result.decision,
            amount = ?result.amount,
            clauses = result.clause_mapping.len(),
            "query answered"
        );
        Ok(result)
    }

    /// Answer a batch of questions, one answer string per question, in
    /// order. A failing question yields an error sentence instead of
    /// aborting the batch.
    pub async fn answer_questions(&self, index: &ChunkIndex, questions: &[String]) -> Vec<String> {
        let mut answers = Vec::with_capacity(questions.len());
        for question in questions {
            match self.query(index, question, None).await {
                Ok(result) => answers.push(result.justification),
                Err(err) => {
                    tracing::warn!(question, error = %err, "question failed");
                    answers.push(format!("Unable to answer this question: {}", err));
                }
            }
        }
        answers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Decision, DocumentChunk};
    use crate::embeddings::HashEmbedder;
    use pretty_assertions::assert_eq;

    fn pipeline() -> RagPipeline {
        let config = RagConfig {
            embedding: crate::config::EmbeddingBackend::hashed_default(),
            min_chunk_chars: 1,
            ..RagConfig::default()
        };
        RagPipeline::with_components(
            config,
            Box::new(HashEmbedder::default()),
            AnswerEngine::new(None),
        )
        .unwrap()
    }

    fn index_of(texts: &[&str]) -> ChunkIndex {
        let embedder = HashEmbedder::default();
        let chunks: Vec<DocumentChunk> = texts
            .iter()
            .enumerate()
            .map(|(i, text)| DocumentChunk {
                text: text.to_string(),
                page: 1,
                section: None,
                source_filename: "policy.pdf".to_string(),
                chunk_index: i,
            })
            .collect();
        let embeddings = embedder.embed_batch(texts).unwrap();
        ChunkIndex::build("policy.pdf", chunks, embeddings).unwrap()
    }

    #[test]
    fn grace_period_chunk_is_top_hit() {
        let pipeline = pipeline();
        let index = index_of(&[
            "Maternity benefits carry a waiting period of two years.",
            "Grace period is thirty days.",
            "Cataract surgery has a waiting period of one year.",
        ]);

        let hits = pipeline.retrieve(&index, "grace period", Some(1)).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.chunk_index, 1);
    }

    #[tokio::test]
    async fn query_produces_structured_result() {
        let pipeline = pipeline();
        let index = index_of(&["The sum insured is Rs. 200,000 for hospitalization expenses."]);

        let result = pipeline
            .query(&index, "hospitalization coverage", None)
            .await
            .unwrap();
        assert_eq!(result.decision, Decision::Approved);
        assert_eq!(result.amount, Some(200_000.0));
        assert!(!result.clause_mapping.is_empty());
    }

    #[tokio::test]
    async fn empty_query_is_invalid_request() {
        let pipeline = pipeline();
        let index = index_of(&["anything"]);
        let err = pipeline.query(&index, "  ", None).await.unwrap_err();
        assert!(matches!(err, RagError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn batch_answers_preserve_question_order() {
        let pipeline = pipeline();
        let index = index_of(&[
            "Grace period is thirty days for premium payment.",
            "Pre-existing diseases have a waiting period of four years.",
        ]);

        let questions = vec![
            "What is the grace period?".to_string(),
            "".to_string(), // invalid, must not abort the batch
            "Waiting period for pre-existing diseases?".to_string(),
        ];
        let answers = pipeline.answer_questions(&index, &questions).await;
        assert_eq!(answers.len(), 3);
        assert!(answers[1].starts_with("Unable to answer"));
    }

    #[tokio::test]
    async fn missing_document_is_not_found() {
        let pipeline = pipeline();
        let source = DocumentSource::parse("/definitely/missing.pdf").unwrap();
        let err = pipeline.process_document(&source).await.unwrap_err();
        assert!(matches!(err, RagError::DocumentNotFound(_)));
    }
}
