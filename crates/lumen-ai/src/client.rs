use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Upper bound on any provider call; past this the call fails as retryable
/// rather than hanging the handler.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("AI provider API key not configured")]
    NotConfigured,
    #[error("AI provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("AI provider returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("AI provider response was malformed: {0}")]
    Malformed(String),
    #[error("AI provider returned no choices")]
    Empty,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system", content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user", content: content.into() }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
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

/// Thin chat-completions client for OpenRouter.
pub struct ChatClient {
    api_key: String,
    model: String,
    http: reqwest::Client,
}

impl ChatClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            http,
        })
    }

    /// One chat-completion round trip; returns the first choice's content.
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, AiError> {
        if self.api_key.is_empty() {
            return Err(AiError::NotConfigured);
        }

        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens,
            temperature,
        };

        let response = self
            .http
            .post(OPENROUTER_API_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| AiError::Malformed(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(AiError::Empty)
    }
}
