use std::time::Duration;

use configs::AiConfig;
use tracing::{debug, instrument, warn};

use super::sse;
use super::{check_status, AiError, ChatRequest, CompletionBody, CompletionResponse, DeltaStream};

/// DeepSeek-compatible chat-completions client.
#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    cfg: AiConfig,
}

impl LlmClient {
    pub fn new(cfg: AiConfig) -> Self {
        Self { http: reqwest::Client::new(), cfg }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key().is_ok()
    }

    pub fn check_configured(&self) -> Result<(), AiError> {
        self.api_key().map(|_| ())
    }

    pub fn fallback_text(&self) -> Option<&str> {
        self.cfg.fallback_text.as_deref()
    }

    fn api_key(&self) -> Result<&str, AiError> {
        self.cfg
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AiError::NotConfigured("Deepseek API Key is missing.".into()))
    }

    fn request(&self, req: &ChatRequest, stream: bool) -> Result<reqwest::RequestBuilder, AiError> {
        let key = self.api_key()?;
        let body = CompletionBody {
            model: &self.cfg.model,
            messages: &req.messages,
            temperature: req.temperature,
            max_tokens: req.max_tokens,
            stream,
        };
        Ok(self.http.post(&self.cfg.api_url).bearer_auth(key).json(&body))
    }

    /// One-shot completion; returns `choices[0].message.content`.
    #[instrument(skip_all, fields(messages = req.messages.len()))]
    pub async fn complete(&self, req: &ChatRequest) -> Result<String, AiError> {
        let resp = self
            .request(req, false)?
            .timeout(Duration::from_secs(self.cfg.timeout_secs))
            .send()
            .await?;
        let parsed: CompletionResponse = check_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| AiError::Decode(e.to_string()))?;
        let content = parsed.into_content()?;
        debug!(chars = content.chars().count(), "completion received");
        Ok(content)
    }

    /// Open a streaming completion. Only the response head is bounded by the timeout;
    /// the body streams for as long as the upstream keeps sending.
    #[instrument(skip_all, fields(messages = req.messages.len()))]
    pub async fn open_stream(&self, req: &ChatRequest) -> Result<DeltaStream, AiError> {
        let send = self.request(req, true)?.send();
        let resp = match tokio::time::timeout(Duration::from_secs(self.cfg.timeout_secs), send).await {
            Ok(r) => r?,
            Err(_) => {
                warn!("completion stream did not open in time");
                return Err(AiError::Timeout);
            }
        };
        let resp = check_status(resp).await?;
        Ok(sse::deltas(resp.bytes_stream()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::ChatMessage;

    #[tokio::test]
    async fn missing_key_is_configuration_error() {
        let client = LlmClient::new(AiConfig { api_key: Some("  ".into()), ..Default::default() });
        assert!(!client.is_configured());
        let req = ChatRequest {
            messages: vec![ChatMessage { role: "user".into(), content: "hi".into() }],
            temperature: 1.0,
            max_tokens: 10,
            stream: false,
        };
        let err = client.complete(&req).await.unwrap_err();
        assert!(matches!(err, AiError::NotConfigured(_)));
        assert!(err.to_string().starts_with("API Configuration Error"));
    }
}
