//! Reasoning over retrieved chunks.
//!
//! The reasoning step is an external capability behind the [`Answerer`]
//! trait: a remote LLM variant and a local rule-based variant. The
//! [`AnswerEngine`] selects between them by configuration and degrades to
//! the rules when the remote call returns a typed failure; this is the only
//! error the pipeline recovers from silently.

pub mod openai;
pub mod rules;

use async_trait::async_trait;

use crate::config::RagConfig;
use crate::document::QueryResult;
use crate::error::{RagError, ReasoningError};
use crate::index::ScoredChunk;

pub use openai::OpenAiAnswerer;
pub use rules::RuleBasedAnswerer;

/// Produces a structured answer from a query and retrieved context
#[async_trait]
pub trait Answerer: Send + Sync {
    async fn answer(
        &self,
        query: &str,
        context: &[ScoredChunk],
    ) -> Result<QueryResult, ReasoningError>;
}

/// Remote-first answerer with automatic rule-based fallback
pub struct AnswerEngine {
    remote: Option<Box<dyn Answerer>>,
    fallback: RuleBasedAnswerer,
}

impl AnswerEngine {
    /// Build the engine from configuration: remote reasoning when an API
    /// key is present, rules-only otherwise.
    pub fn from_config(config: &RagConfig) -> Result<Self, RagError> {
        let remote: Option<Box<dyn Answerer>> = match &config.openai_api_key {
            Some(key) => Some(Box::new(OpenAiAnswerer::new(
                key,
                &config.openai_base_url,
                &config.openai_model,
                config.request_timeout_secs,
            )?)),
            None => {
                tracing::warn!("no API key configured, using rule-based reasoning only");
                None
            }
        };
        Ok(Self::new(remote))
    }

    pub fn new(remote: Option<Box<dyn Answerer>>) -> Self {
        Self {
            remote,
            fallback: RuleBasedAnswerer::new(),
        }
    }

    /// Answer a query over retrieved context. Never fails: remote errors
    /// route to the rule-based fallback, and empty context yields a
    /// well-formed no-match result.
    pub async fn answer(&self, query: &str, context: &[ScoredChunk]) -> QueryResult {
        if context.is_empty() {
            tracing::warn!(query, "no relevant chunks retrieved");
            return QueryResult::no_match();
        }

        if let Some(remote) = &self.remote {
            match remote.answer(query, context).await {
                Ok(result) => return result,
                Err(err) => {
                    tracing::warn!(error = %err, "remote reasoning failed, using fallback");
                }
            }
        }

        self.fallback.respond(query, context)
    }
}

/// System prompt demanding the structured JSON answer shape.
pub(crate) const SYSTEM_PROMPT: &str = r#"You are an expert insurance policy analyst. Your task is to analyze insurance policy documents and make decisions on claims based on the provided context.

You must respond with ONLY a valid JSON object in the exact format specified below. Do not include any other text, explanations, or markdown formatting.

Required JSON format:
{
  "decision": "approved", "rejected" or "unclear",
  "amount": <number or null>,
  "justification": "<explanation referencing specific clauses>",
  "clause_mapping": [
    {
      "clause_text": "<exact text snippet from document>",
      "source": {
        "filename": "<filename>",
        "page": <page_number>,
        "section": "<section_name or null>"
      }
    }
  ]
}

Guidelines:
1. Base your decision strictly on the provided policy document chunks
2. Reference specific clauses in your justification
3. Include exact text snippets in clause_mapping
4. Set amount to null if not applicable or not specified
5. Be precise and cite sources accurately"#;

/// Render the retrieved chunks and query into the user prompt.
pub(crate) fn build_user_prompt(query: &str, context: &[ScoredChunk]) -> String {
    let mut sections = Vec::with_capacity(context.len());
    for (i, hit) in context.iter().enumerate() {
        sections.push(format!(
            "CHUNK {} (Relevance: {:.3}):\nSource: {}, Page {}, Section: {}\nText: {}",
            i + 1,
            hit.score,
            hit.chunk.source_filename,
            hit.chunk.page,
            hit.chunk.section.as_deref().unwrap_or("General"),
            hit.chunk.text,
        ));
    }

    format!(
        "Query: {}\n\nPolicy Document Context:\n{}\n\nAnalyze the query against the policy context and provide your decision in the required JSON format.",
        query,
        sections.join("\n\n"),
    )
}
