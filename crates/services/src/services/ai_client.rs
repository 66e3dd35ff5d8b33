//! Client for an OpenAI-compatible chat completions endpoint.
//!
//! Works against hosted providers and local servers (LM Studio, Ollama) alike;
//! everything it needs comes in through [`AiConfig`].

use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::warn;

use super::chat_payload;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Debug, Clone, Error)]
pub enum AiClientError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("invalid api key")]
    InvalidApiKey,
    #[error("json error: {0}")]
    Serde(String),
    #[error("AI provider is not configured")]
    NotConfigured,
}

impl AiClientError {
    /// Returns true if the error is transient and should be retried.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout | Self::RateLimited => true,
            Self::Http { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiConfig {
    /// Base URL up to and including the version segment, e.g. `http://localhost:1234/v1`.
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl AiConfig {
    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
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

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: &'a [Message],
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub id: Option<String>,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: Message,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Text of the first choice.
    pub fn text(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct AiClient {
    http: Client,
    config: AiConfig,
}

impl AiClient {
    pub fn new(config: AiConfig) -> Result<Self, AiClientError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("laundromat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AiClientError::Transport(e.to_string()))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// Sends `messages` and returns the raw response, retrying transient failures.
    pub async fn complete(
        &self,
        messages: &[Message],
        max_tokens: u32,
    ) -> Result<ChatResponse, AiClientError> {
        let request = ChatRequest {
            model: &self.config.model,
            max_tokens,
            messages,
        };

        (|| async { self.send_request(&request).await })
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(Duration::from_secs(1))
                    .with_max_delay(Duration::from_secs(30))
                    .with_max_times(3)
                    .with_jitter(),
            )
            .when(|e: &AiClientError| e.should_retry())
            .notify(|e, dur| {
                warn!(
                    "AI request failed, retrying after {:.2}s: {}",
                    dur.as_secs_f64(),
                    e
                )
            })
            .await
    }

    async fn send_request(&self, request: &ChatRequest<'_>) -> Result<ChatResponse, AiClientError> {
        let mut builder = self.http.post(self.config.completions_url()).json(request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let res = builder.send().await.map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => res
                .json::<ChatResponse>()
                .await
                .map_err(|e| AiClientError::Serde(e.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AiClientError::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => Err(AiClientError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(AiClientError::Http { status, body })
            }
        }
    }

    /// Sends a conversation and returns the assistant's text.
    pub async fn chat(&self, messages: &[Message]) -> Result<String, AiClientError> {
        self.complete(messages, DEFAULT_MAX_TOKENS)
            .await?
            .text()
            .map(str::to_string)
            .ok_or_else(|| AiClientError::Serde("No text content in response".to_string()))
    }

    /// Single prompt with an optional system message.
    pub async fn ask(&self, prompt: &str, system: Option<&str>) -> Result<String, AiClientError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(Message::system(system));
        }
        messages.push(Message::user(prompt));
        self.chat(&messages).await
    }

    /// Sends a prompt expecting a JSON answer, tolerating fences and prose around it.
    pub async fn ask_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<T, AiClientError> {
        let response = self.ask(prompt, system).await?;
        if response.trim().is_empty() {
            tracing::error!("AI provider returned an empty response");
            return Err(AiClientError::Serde("Empty response".to_string()));
        }

        let Some(value) = chat_payload::extract_structured(&response) else {
            tracing::error!(
                response_preview = %response.chars().take(500).collect::<String>(),
                "Failed to extract JSON from response"
            );
            return Err(AiClientError::Serde("Could not extract JSON from response".to_string()));
        };

        serde_json::from_value(value).map_err(|e| {
            tracing::error!(json_error = %e, "Failed to parse JSON response");
            AiClientError::Serde(e.to_string())
        })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> AiClientError {
    if e.is_timeout() {
        AiClientError::Timeout
    } else {
        AiClientError::Transport(e.to_string())
    }
}
