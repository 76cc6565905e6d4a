//! Chat-completion clients: the direct LLM API and the optional ZeroClaw agent daemon.

pub mod client;
pub mod sse;
pub mod zeroclaw;

use std::pin::Pin;

use futures_util::Stream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use client::LlmClient;
pub use zeroclaw::AgentClient;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("API Configuration Error: {0}")]
    NotConfigured(String),
    #[error("upstream error: {0}")]
    Upstream(String),
    #[error("upstream timed out")]
    Timeout,
    #[error("invalid upstream response: {0}")]
    Decode(String),
    #[error("{0}")]
    Validation(String),
}

impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AiError::Timeout
        } else {
            AiError::Upstream(e.to_string())
        }
    }
}

/// Relayed content deltas of one streaming completion.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String, AiError>> + Send>>;
/// Raw upstream body chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, AiError>> + Send>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

fn default_chat_temperature() -> f32 { 1.0 }
fn default_agent_temperature() -> f32 { 0.7 }
fn default_max_tokens() -> u32 { 4000 }
fn default_true() -> bool { true }

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default = "default_chat_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub stream: bool,
}

fn require_messages(messages: &[ChatMessage]) -> Result<(), AiError> {
    if messages.is_empty() {
        return Err(AiError::Validation("messages must not be empty".into()));
    }
    Ok(())
}

impl ChatRequest {
    pub fn validate(&self) -> Result<(), AiError> {
        require_messages(&self.messages)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default, alias = "agentId")]
    pub agent_id: Option<String>,
    #[serde(default = "default_agent_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_true")]
    pub stream: bool,
}

impl AgentRequest {
    pub fn validate(&self) -> Result<(), AiError> {
        require_messages(&self.messages)
    }

    /// The same conversation for the direct LLM fallback.
    pub fn to_chat(&self) -> ChatRequest {
        ChatRequest {
            messages: self.messages.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: self.stream,
        }
    }
}

/// Upstream request body shared by both clients.
#[derive(Debug, Serialize)]
pub(crate) struct CompletionBody<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

impl CompletionResponse {
    pub(crate) fn into_content(self) -> Result<String, AiError> {
        self.choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| AiError::Decode("Invalid API Response Structure".into()))
    }
}

/// Non-2xx upstream answers become `Upstream` with the provider's message when present.
pub(crate) async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, AiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or(body);
    Err(AiError::Upstream(format!("{}: {}", status, detail)))
}
