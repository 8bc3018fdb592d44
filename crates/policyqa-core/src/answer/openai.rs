//! Remote reasoning over an OpenAI-compatible chat-completions endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::document::QueryResult;
use crate::error::{RagError, ReasoningError};
use crate::index::ScoredChunk;

use super::{build_user_prompt, Answerer, SYSTEM_PROMPT};

/// Low temperature keeps decisions consistent across identical requests
const TEMPERATURE: f32 = 0.1;
const MAX_TOKENS: usize = 1000;

/// Chat-completions client that asks the model for the structured answer
pub struct OpenAiAnswerer {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OpenAiAnswerer {
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, RagError> {
        if api_key.trim().is_empty() {
            return Err(RagError::InvalidConfiguration(
                "API key cannot be empty".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|_| {
                RagError::InvalidConfiguration("API key contains invalid characters".to_string())
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|err| {
                RagError::InvalidConfiguration(format!("failed to build HTTP client: {}", err))
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl Answerer for OpenAiAnswerer {
    async fn answer(
        &self,
        query: &str,
        context: &[ScoredChunk],
    ) -> Result<QueryResult, ReasoningError> {
        let user_prompt = build_user_prompt(query, context);
        let body = ChatRequest {
            model: &self.model,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|err| ReasoningError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(ReasoningError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|err| ReasoningError::MalformedOutput(err.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(ReasoningError::EmptyCompletion)?;

        tracing::debug!(chars = content.len(), "remote reasoning response received");
        parse_result(&content)
    }
}

/// Parse the model's JSON answer, tolerating markdown code fences.
fn parse_result(raw: &str) -> Result<QueryResult, ReasoningError> {
    let mut text = raw.trim();
    if let Some(stripped) = text.strip_prefix("```json").or_else(|| text.strip_prefix("```")) {
        text = stripped.strip_suffix("```").unwrap_or(stripped).trim();
    }

    serde_json::from_str(text).map_err(|err| ReasoningError::MalformedOutput(err.to_string()))
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: usize,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Decision;

    const VALID: &str = r#"{
        "decision": "approved",
        "amount": 150000,
        "justification": "Covered under clause 4.2.",
        "clause_mapping": [
            {
                "clause_text": "Knee surgery is covered after 90 days.",
                "source": {"filename": "policy.pdf", "page": 4, "section": "SURGICAL BENEFITS"}
            }
        ]
    }"#;

    #[test]
    fn parses_plain_json() {
        let result = parse_result(VALID).unwrap();
        assert_eq!(result.decision, Decision::Approved);
        assert_eq!(result.amount, Some(150000.0));
        assert_eq!(result.clause_mapping.len(), 1);
    }

    #[test]
    fn parses_fenced_json() {
        let fenced = format!("```json\n{}\n```", VALID);
        assert!(parse_result(&fenced).is_ok());
    }

    #[test]
    fn prose_is_malformed_output() {
        let err = parse_result("I think the claim should be approved.").unwrap_err();
        assert!(matches!(err, ReasoningError::MalformedOutput(_)));
    }

    #[test]
    fn unknown_decision_is_malformed_output() {
        let raw = r#"{"decision": "maybe", "amount": null, "justification": "", "clause_mapping": []}"#;
        assert!(matches!(
            parse_result(raw),
            Err(ReasoningError::MalformedOutput(_))
        ));
    }

    #[test]
    fn empty_key_is_invalid_configuration() {
        assert!(OpenAiAnswerer::new("", "https://api.openai.com/v1", "gpt-4", 60).is_err());
    }
}
