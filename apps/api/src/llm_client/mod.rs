/// Completion client — the single point of entry for all AI calls in Koze.
///
/// ARCHITECTURAL RULE: No other module may call the completion endpoint
/// directly. All AI interactions MUST go through this module.
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::errors::AppError;

/// The model used for chat turns. Intentionally hardcoded to prevent drift.
pub const CHAT_MODEL: &str = "google/gemini-3-flash-preview";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response from the completion endpoint. Status and body are
    /// kept as-is so callers can forward them.
    #[error("completion endpoint returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("completion endpoint returned no choices")]
    EmptyCompletion,
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Upstream { status, body } => AppError::Upstream { status, body },
            LlmError::Http(e) => AppError::Internal(anyhow::anyhow!("completion request failed: {e}")),
            LlmError::EmptyCompletion => {
                AppError::Internal(anyhow::anyhow!("completion endpoint returned no choices"))
            }
        }
    }
}

/// One role/content pair forwarded to the completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Optional sampling parameters. Chat turns send none; project generation
/// sets a temperature and a larger token budget.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// The single completion client used by all services in Koze.
/// Wraps an OpenAI-compatible `/chat/completions` endpoint.
///
/// Calls are single-attempt by design: an upstream failure is surfaced to
/// the caller with its original status and body, never retried.
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl CompletionClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }

    /// Sends the message array and returns the first completion's text.
    pub async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: CompletionOptions,
    ) -> Result<String, LlmError> {
        let request_body = CompletionRequest {
            model,
            messages,
            stream: false,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response.json().await?;
        let text = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(LlmError::EmptyCompletion)?;

        debug!("Completion call succeeded ({} chars)", text.len());

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn complete_returns_first_choice_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"Bonjou! How can I help?"}}]}"#)
            .create_async()
            .await;

        let client = CompletionClient::new(server.url(), "test-key".to_string());
        let reply = client
            .complete(CHAT_MODEL, &[ChatMessage::user("Salut")], CompletionOptions::default())
            .await
            .unwrap();

        assert_eq!(reply, "Bonjou! How can I help?");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn complete_forwards_upstream_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("quota exceeded")
            .create_async()
            .await;

        let client = CompletionClient::new(server.url(), "test-key".to_string());
        let err = client
            .complete(CHAT_MODEL, &[ChatMessage::user("hi")], CompletionOptions::default())
            .await
            .unwrap_err();

        match err {
            LlmError::Upstream { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "quota exceeded");
            }
            other => panic!("expected Upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn complete_with_empty_choices_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let client = CompletionClient::new(server.url(), "test-key".to_string());
        let err = client
            .complete(CHAT_MODEL, &[ChatMessage::user("hi")], CompletionOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::EmptyCompletion));
    }

    #[test]
    fn chat_request_serializes_without_unset_sampling_params() {
        let messages = vec![ChatMessage::user("hello")];
        let request = CompletionRequest {
            model: CHAT_MODEL,
            messages: &messages,
            stream: false,
            temperature: None,
            max_tokens: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], CHAT_MODEL);
        assert_eq!(json["stream"], false);
        assert!(json.get("temperature").is_none());
        assert!(json.get("max_tokens").is_none());
    }
}
