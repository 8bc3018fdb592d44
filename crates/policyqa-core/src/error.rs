use thiserror::Error;

/// Errors surfaced by the retrieval pipeline
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Reasoning service failed: {0}")]
    Reasoning(#[from] ReasoningError),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Typed failure from the remote reasoning service.
///
/// Any of these triggers the rule-based fallback; they are never surfaced
/// to the caller unless the fallback itself is disabled.
#[derive(Error, Debug)]
pub enum ReasoningError {
    #[error("no API key configured")]
    MissingCredentials,

    #[error("request failed: {0}")]
    Transport(String),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response contained no completion")]
    EmptyCompletion,

    #[error("unparsable model output: {0}")]
    MalformedOutput(String),
}
