//! Messages API client.

use std::fmt;
use std::time::Duration;

use adventure_core::error::DomainError;
use adventure_narrative::application::generator::StoryModel;
use adventure_narrative::domain::prompt::StoryPrompt;
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Failures talking to the Messages API.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("reply contained no text")]
    EmptyReply,
}

impl From<LlmError> for DomainError {
    fn from(err: LlmError) -> Self {
        DomainError::Infrastructure(err.to_string())
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

/// `StoryModel` that asks a Claude model for the next scene.
#[derive(Clone)]
pub struct AnthropicStoryModel {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl fmt::Debug for AnthropicStoryModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicStoryModel")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl AnthropicStoryModel {
    /// Creates a client for `model` authenticated with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Config` if the key is blank or the HTTP client
    /// cannot be built.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::Config("API key is empty".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| LlmError::Config(e.to_string()))?;
        Ok(Self {
            client,
            api_key,
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
        })
    }

    /// Points the client at a different API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    fn headers(&self) -> Result<HeaderMap, LlmError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| LlmError::Config(format!("invalid API key: {e}")))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        Ok(headers)
    }

    /// Sends `prompt` and returns the concatenated text of the reply.
    ///
    /// # Errors
    ///
    /// Returns `LlmError` on transport failure, a non-success status, an
    /// unparseable body or a reply with no text blocks.
    pub async fn send(&self, prompt: &StoryPrompt) -> Result<String, LlmError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system: &prompt.system,
            messages: [Message {
                role: "user",
                content: &prompt.user,
            }],
        };

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let text: String = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect();
        if text.trim().is_empty() {
            return Err(LlmError::EmptyReply);
        }
        debug!(model = %self.model, chars = text.len(), "story model replied");
        Ok(text)
    }
}

#[async_trait]
impl StoryModel for AnthropicStoryModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &StoryPrompt) -> Result<String, DomainError> {
        Ok(self.send(prompt).await?)
    }
}

#[cfg(test)]
mod tests {
    use axum::Json;
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use serde_json::{Value, json};

    use super::*;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn prompt() -> StoryPrompt {
        StoryPrompt {
            system: "Reply with JSON.".to_owned(),
            user: "PREVIOUS SCENE: The Mysterious Forest".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_send_posts_prompt_and_joins_text_blocks() {
        // Arrange
        let router = Router::new().route(
            "/messages",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["x-api-key"], "test-key");
                assert_eq!(headers["anthropic-version"], API_VERSION);
                assert_eq!(body["model"], "test-model");
                assert_eq!(body["system"], "Reply with JSON.");
                assert_eq!(body["messages"][0]["role"], "user");
                Json(json!({
                    "content": [
                        { "type": "text", "text": "{\"title\":" },
                        { "type": "tool_use", "id": "x", "name": "y", "input": {} },
                        { "type": "text", "text": " \"Gate\"}" }
                    ]
                }))
            }),
        );
        let base = serve(router).await;
        let model = AnthropicStoryModel::new("test-key", "test-model")
            .unwrap()
            .with_base_url(base);

        // Act
        let reply = model.send(&prompt()).await.unwrap();

        // Assert
        assert_eq!(reply, "{\"title\": \"Gate\"}");
    }

    #[tokio::test]
    async fn test_error_status_becomes_api_error() {
        let router = Router::new().route(
            "/messages",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let base = serve(router).await;
        let model = AnthropicStoryModel::new("test-key", "test-model")
            .unwrap()
            .with_base_url(base);

        let result = model.send(&prompt()).await;

        match result {
            Err(LlmError::Api { status, message }) => {
                assert_eq!(status, 429);
                assert_eq!(message, "slow down");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reply_without_text_is_rejected() {
        let router = Router::new().route(
            "/messages",
            post(|| async { Json(json!({ "content": [] })) }),
        );
        let base = serve(router).await;
        let model = AnthropicStoryModel::new("test-key", "test-model")
            .unwrap()
            .with_base_url(base);

        let result = model.complete(&prompt()).await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }

    #[test]
    fn test_blank_key_is_a_config_error() {
        assert!(matches!(
            AnthropicStoryModel::new("  ", DEFAULT_MODEL),
            Err(LlmError::Config(_))
        ));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let model = AnthropicStoryModel::new("sk-secret", DEFAULT_MODEL).unwrap();

        let rendered = format!("{model:?}");

        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains(DEFAULT_MODEL));
    }
}
