use serde::{Deserialize, Serialize};

/// A bounded substring of document text with attached source metadata.
///
/// Chunks are created once during ingestion and never mutated. They live in
/// memory for the lifetime of one document's index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub text: String,
    /// Page the chunk was extracted from (1-indexed)
    pub page: u32,
    /// Section heading in effect on the page, if one was detected
    pub section: Option<String>,
    pub source_filename: String,
    /// Position of the chunk within its page
    pub chunk_index: usize,
}

impl DocumentChunk {
    /// Stable identifier used in logs and audit output.
    pub fn id(&self) -> String {
        format!(
            "{}_p{}_c{}",
            self.source_filename,
            self.page,
            self.chunk_index + 1
        )
    }
}

/// Claim decision produced by an answerer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
    Unclear,
}

/// Where a cited clause came from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClauseSource {
    pub filename: String,
    pub page: u32,
    pub section: Option<String>,
}

/// One cited clause with its source location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClauseRef {
    pub clause_text: String,
    pub source: ClauseSource,
}

/// Structured answer returned to the caller. Constructed fresh per query;
/// never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub decision: Decision,
    pub amount: Option<f64>,
    pub justification: String,
    pub clause_mapping: Vec<ClauseRef>,
}

impl QueryResult {
    /// Result returned when retrieval finds nothing relevant.
    pub fn no_match() -> Self {
        Self {
            decision: Decision::Rejected,
            amount: None,
            justification: "No relevant policy clauses found for the query.".to_string(),
            clause_mapping: Vec::new(),
        }
    }
}

impl ClauseRef {
    /// Build a clause reference from a chunk, truncating long text to
    /// `max_chars` on a character boundary.
    pub fn from_chunk(chunk: &DocumentChunk, max_chars: usize) -> Self {
        let clause_text = if chunk.text.chars().count() > max_chars {
            let cut: String = chunk.text.chars().take(max_chars).collect();
            format!("{}...", cut)
        } else {
            chunk.text.clone()
        };

        Self {
            clause_text,
            source: ClauseSource {
                filename: chunk.source_filename.clone(),
                page: chunk.page,
                section: chunk.section.clone(),
            },
        }
    }
}
