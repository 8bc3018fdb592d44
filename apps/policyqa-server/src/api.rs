//! HTTP handlers for the policyQA server
//!
//! Endpoints:
//! - `GET  /health` - liveness probe
//! - `POST /query` - structured decision for one query against a document
//! - `POST /api/v1/hackrx/run` - batch question answering (evaluation contract)
//! - `GET  /stats` - index cache contents

use std::sync::Arc;

use axum::{extract::State, Json};
use policyqa_core::{DocumentSource, QueryResult, RagError};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ServerError;
use crate::state::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "policyqa-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Query request body
#[derive(Deserialize)]
pub struct QueryApiRequest {
    /// Document location: local path or http(s) URL
    #[serde(alias = "policy_path", alias = "policy_url")]
    pub policy: String,
    pub query: String,
    /// Retrieval depth override; server default applies when absent
    pub top_k: Option<usize>,
}

/// Handler: POST /query
pub async fn handle_query(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QueryApiRequest>,
) -> Result<Json<QueryResult>, ServerError> {
    info!(policy = %req.policy, query = %req.query, "query request");

    if let Some(0) = req.top_k {
        return Err(RagError::InvalidConfiguration("top_k must be at least 1".to_string()).into());
    }

    let source = DocumentSource::parse(&req.policy)?;
    let index = state.index_for(&source).await?;
    let result = state.pipeline.query(&index, &req.query, req.top_k).await?;
    Ok(Json(result))
}

/// Batch request body (hackathon evaluation contract)
#[derive(Deserialize)]
pub struct RunRequest {
    /// URL (or path) of the policy document
    pub documents: String,
    pub questions: Vec<String>,
}

/// Batch response: one answer string per question, same order
#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub answers: Vec<String>,
}

/// Handler: POST /api/v1/hackrx/run
pub async fn handle_run(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RunRequest>,
) -> Result<Json<RunResponse>, ServerError> {
    info!(documents = %req.documents, questions = req.questions.len(), "batch run request");

    if req.questions.is_empty() {
        return Err(RagError::InvalidRequest("questions cannot be empty".to_string()).into());
    }

    let source = DocumentSource::parse(&req.documents)?;
    let index = state.index_for(&source).await?;
    let answers = state.pipeline.answer_questions(&index, &req.questions).await;
    Ok(Json(RunResponse { answers }))
}

/// Cache statistics response
#[derive(Serialize)]
pub struct StatsResponse {
    pub documents_cached: usize,
    pub sources: Vec<String>,
}

/// Handler: GET /stats
pub async fn handle_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let sources = state.cached_sources().await;
    Json(StatsResponse {
        documents_cached: sources.len(),
        sources,
    })
}
