//! Chat-completion client.
//!
//! [`ChatOracle`] talks to an OpenAI-compatible `/v1/chat/completions`
//! endpoint. Provider failures surface as [`OracleError`]; a successful
//! response with a blank completion is replaced by the tool's canned
//! fallback text and flagged on the returned [`Generation`].

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{fallback, Generation, GenerationRequest, Oracle, OracleError};

/// Configuration for [`ChatOracle`].
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Base URL of the provider, without the `/v1/...` path.
    pub api_url: String,
    /// Bearer token sent on every request.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature, when the provider default is not wanted.
    pub temperature: Option<f32>,
    /// Completion token cap, when the provider default is not wanted.
    pub max_tokens: Option<u32>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com".to_owned(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_owned(),
            temperature: Some(0.8),
            max_tokens: Some(900),
            timeout_secs: 60,
        }
    }
}

/// Oracle backed by an OpenAI-compatible chat-completion API.
pub struct ChatOracle {
    client: reqwest::Client,
    config: OracleConfig,
}

impl ChatOracle {
    /// Creates a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Configuration`] when the API key is empty or
    /// the HTTP client cannot be built.
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        if config.api_key.trim().is_empty() {
            return Err(OracleError::Configuration("api key is empty".to_owned()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OracleError::Configuration(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Oracle for ChatOracle {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, OracleError> {
        let url = format!("{}/v1/chat/completions", self.config.api_url);
        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(&request.prompt.system),
                ChatMessage::user(&request.prompt.user),
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        tracing::debug!(tool = %request.tool, model = %self.config.model, "requesting completion");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorBody>(&text) {
                Ok(parsed) => parsed.error.message,
                Err(_) => truncate(&text, 200),
            };
            tracing::warn!(tool = %request.tool, status = status.as_u16(), "completion rejected");
            return Err(OracleError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Http(format!("invalid completion body: {e}")))?;

        let content = completion
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .unwrap_or_default()
            .trim();

        if content.is_empty() {
            tracing::warn!(tool = %request.tool, "blank completion, serving fallback text");
            return Ok(Generation {
                content: fallback::content(request.tool).to_owned(),
                fallback: true,
            });
        }

        Ok(Generation {
            content: content.to_owned(),
            fallback: false,
        })
    }
}

fn truncate(text: &str, max: usize) -> String {
    let trimmed = text.trim();
    if trimmed.len() <= max {
        trimmed.to_owned()
    } else {
        let mut end = max;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &trimmed[..end])
    }
}

// ====== Wire Types ======

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

impl ChatMessage {
    fn system(content: &str) -> Self {
        Self {
            role: "system",
            content: content.to_owned(),
        }
    }

    fn user(content: &str) -> Self {
        Self {
            role: "user",
            content: content.to_owned(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}
