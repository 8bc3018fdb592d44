use std::io::Write;
use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use lopdf::{Document, Object};
use policyqa_core::{
    AnswerEngine, Decision, EmbeddingBackend, HashEmbedder, RagConfig, RagPipeline,
};
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

use crate::api::{
    handle_health, handle_query, handle_run, handle_stats, QueryApiRequest, RunRequest,
};
use crate::state::AppState;

fn one_page_pdf(text: &str) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().expect("encode content stream"),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("serialize PDF");
    bytes
}

fn policy_file() -> NamedTempFile {
    let text = "Knee surgery is covered after a waiting period of 90 days. \
        Cosmetic procedures are excluded from this policy. \
        The maximum claim amount is Rs. 500,000 per policy year.";
    let mut file = tempfile::Builder::new()
        .suffix(".pdf")
        .tempfile()
        .expect("create temp file");
    file.write_all(&one_page_pdf(text)).expect("write PDF");
    file
}

fn test_state() -> Arc<AppState> {
    let config = RagConfig {
        embedding: EmbeddingBackend::Hashed { dimension: 64 },
        min_chunk_chars: 10,
        ..RagConfig::default()
    }
    .with_chunking(80, 20);
    let pipeline = RagPipeline::with_components(
        config,
        Box::new(HashEmbedder::new(64)),
        AnswerEngine::new(None),
    )
    .expect("build pipeline");
    Arc::new(AppState::new(pipeline, 4))
}

#[tokio::test]
async fn health_reports_service_metadata() {
    let response = handle_health().await;
    assert_eq!(response.0.status, "healthy");
    assert_eq!(response.0.service, "policyqa-server");
}

#[tokio::test]
async fn query_returns_structured_decision() {
    let file = policy_file();
    let state = test_state();

    let request = QueryApiRequest {
        policy: file.path().to_string_lossy().into_owned(),
        query: "Is knee surgery covered?".to_string(),
        top_k: None,
    };
    let Json(result) = handle_query(State(state), Json(request))
        .await
        .expect("query succeeds");

    assert!(matches!(
        result.decision,
        Decision::Approved | Decision::Rejected | Decision::Unclear
    ));
    assert!(!result.justification.is_empty());
    assert!(!result.clause_mapping.is_empty());
}

#[test]
fn query_request_accepts_document_key_aliases() {
    for key in ["policy", "policy_path", "policy_url"] {
        let raw = format!(r#"{{"{}": "policy.pdf", "query": "grace period"}}"#, key);
        let req: QueryApiRequest =
            serde_json::from_str(&raw).unwrap_or_else(|err| panic!("{} rejected: {}", key, err));
        assert_eq!(req.policy, "policy.pdf");
    }
}

#[tokio::test]
async fn run_preserves_question_order_and_count() {
    let file = policy_file();
    let state = test_state();

    let questions = vec![
        "Is knee surgery covered?".to_string(),
        "Are cosmetic procedures covered?".to_string(),
        "What is the maximum claim amount?".to_string(),
    ];
    let request = RunRequest {
        documents: file.path().to_string_lossy().into_owned(),
        questions: questions.clone(),
    };
    let Json(response) = handle_run(State(state), Json(request))
        .await
        .expect("run succeeds");

    assert_eq!(response.answers.len(), questions.len());
    for answer in &response.answers {
        assert!(!answer.is_empty());
    }
}

#[tokio::test]
async fn run_rejects_empty_question_list() {
    let state = test_state();
    let request = RunRequest {
        documents: "policy.pdf".to_string(),
        questions: vec![],
    };
    let err = handle_run(State(state), Json(request))
        .await
        .expect_err("empty questions rejected");
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_document_maps_to_not_found() {
    let state = test_state();
    let request = QueryApiRequest {
        policy: "/nonexistent/policy.pdf".to_string(),
        query: "Is anything covered?".to_string(),
        top_k: None,
    };
    let err = handle_query(State(state), Json(request))
        .await
        .expect_err("missing document rejected");
    assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn zero_top_k_is_rejected() {
    let file = policy_file();
    let state = test_state();
    let request = QueryApiRequest {
        policy: file.path().to_string_lossy().into_owned(),
        query: "Is knee surgery covered?".to_string(),
        top_k: Some(0),
    };
    let err = handle_query(State(state), Json(request))
        .await
        .expect_err("zero top_k rejected");
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stats_reflect_cached_documents() {
    let file = policy_file();
    let state = test_state();

    let Json(before) = handle_stats(State(Arc::clone(&state))).await;
    assert_eq!(before.documents_cached, 0);

    let request = QueryApiRequest {
        policy: file.path().to_string_lossy().into_owned(),
        query: "Is knee surgery covered?".to_string(),
        top_k: None,
    };
    handle_query(State(Arc::clone(&state)), Json(request))
        .await
        .expect("query succeeds");

    let Json(after) = handle_stats(State(state)).await;
    assert_eq!(after.documents_cached, 1);
    assert_eq!(after.sources.len(), 1);
}
