//! Chat-completions client
//!
//! Provides a `ChatBackend` trait with one implementation:
//! - **OpenRouter**: POSTs `{model, messages}` to an OpenAI-compatible
//!   chat-completions endpoint with bearer auth and reads
//!   `choices[0].message.content` from the reply.
//!
//! No retries: a failed call is terminal for the turn.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::ModelConfig;
use crate::models::ChatMessage;

// ============================================================================
// ChatBackend trait
// ============================================================================

/// Abstraction over chat-completion providers.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send the ordered conversation and return the assistant's raw text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CompletionError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// Error types
// ============================================================================

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Missing reply content in response")]
    MissingContent,

    #[error("Missing API key")]
    MissingApiKey,
}

impl CompletionError {
    /// Network, timeout and non-2xx failures. Everything else is a malformed
    /// or unexpected response.
    pub fn is_transport(&self) -> bool {
        matches!(self, CompletionError::Http(_) | CompletionError::Api { .. })
    }
}

// ============================================================================
// Config
// ============================================================================

#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
    pub referer: String,
    pub title: String,
}

impl OpenRouterConfig {
    pub fn from_model_config(model: &ModelConfig, api_key: String) -> Self {
        Self {
            api_key,
            endpoint: model.endpoint.clone(),
            model: model.model.clone(),
            timeout: Duration::from_secs(model.timeout_seconds),
            referer: model.referer.clone(),
            title: model.title.clone(),
        }
    }
}

// ============================================================================
// Wire structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    code: Option<u16>,
    message: String,
}

// ============================================================================
// OpenRouterClient
// ============================================================================

#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    client: Client,
    config: OpenRouterConfig,
}

impl OpenRouterClient {
    pub fn new(config: OpenRouterConfig) -> Result<Self, CompletionError> {
        if config.api_key.trim().is_empty() {
            return Err(CompletionError::MissingApiKey);
        }

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl ChatBackend for OpenRouterClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CompletionError> {
        let request = CompletionRequest {
            model: &self.config.model,
            messages,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", &self.config.title)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ApiErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error);

            let (code, message) = match detail {
                Some(d) => (d.code.unwrap_or(status.as_u16()), d.message),
                None => (status.as_u16(), body),
            };

            tracing::error!(code = code, message = %message, "Chat completion API error");

            return Err(CompletionError::Api { code, message });
        }

        let parsed: CompletionResponse = serde_json::from_str(&body)
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(CompletionError::MissingContent)
    }

    fn name(&self) -> &str {
        "openrouter"
    }
}

// ============================================================================
// TESTS
// ============================================================================
