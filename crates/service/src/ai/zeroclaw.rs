//! ZeroClaw agent daemon: same completion protocol, SSE passed through untouched.

use std::time::Duration;

use configs::ZeroClawConfig;
use futures_util::{Stream, StreamExt};
use tracing::{instrument, warn};

use super::{check_status, AgentRequest, AiError, ByteStream, CompletionBody, CompletionResponse};

#[derive(Clone)]
pub struct AgentClient {
    http: reqwest::Client,
    cfg: ZeroClawConfig,
}

impl AgentClient {
    pub fn new(cfg: ZeroClawConfig) -> Self {
        Self { http: reqwest::Client::new(), cfg }
    }

    pub fn fallback_to_llm(&self) -> bool {
        self.cfg.fallback_to_llm
    }

    fn request(&self, req: &AgentRequest, stream: bool) -> reqwest::RequestBuilder {
        let model = req
            .agent_id
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or(&self.cfg.default_model);
        let body = CompletionBody {
            model,
            messages: &req.messages,
            temperature: req.temperature,
            max_tokens: req.max_tokens,
            stream,
        };
        self.http.post(&self.cfg.url).bearer_auth(&self.cfg.api_key).json(&body)
    }

    /// The daemon must answer within `stream_connect_timeout_secs`; its body is then relayed as-is.
    #[instrument(skip_all, fields(agent = req.agent_id.as_deref().unwrap_or("default")))]
    pub async fn passthrough(&self, req: &AgentRequest) -> Result<ByteStream, AiError> {
        let wait = Duration::from_secs(self.cfg.stream_connect_timeout_secs);
        let resp = tokio::time::timeout(wait, self.request(req, true).send())
            .await
            .map_err(|_| AiError::Timeout)??;
        let resp = check_status(resp).await?;
        Ok(relay_bytes(resp.bytes_stream()))
    }

    #[instrument(skip_all, fields(agent = req.agent_id.as_deref().unwrap_or("default")))]
    pub async fn complete(&self, req: &AgentRequest) -> Result<String, AiError> {
        let resp = self
            .request(req, false)
            .timeout(Duration::from_secs(self.cfg.request_timeout_secs))
            .send()
            .await?;
        let parsed: CompletionResponse = check_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| AiError::Decode(e.to_string()))?;
        parsed.into_content()
    }
}

/// Upstream bytes unchanged; a read error becomes one final `data: {"error": ...}` event.
fn relay_bytes<S, B, E>(body: S) -> ByteStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let mut body = Box::pin(body);
    Box::pin(async_stream::stream! {
        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(b) => yield Ok::<Vec<u8>, AiError>(b.as_ref().to_vec()),
                Err(e) => {
                    warn!(error = %e, "zeroclaw stream interrupted");
                    let event = serde_json::json!({ "error": "ZeroClaw connection failed" });
                    yield Ok(format!("data: {}\n\n", event).into_bytes());
                    return;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[tokio::test]
    async fn unreachable_daemon_fails_fast() {
        let client = AgentClient::new(ZeroClawConfig {
            url: "http://127.0.0.1:1/v1/chat/completions".into(),
            stream_connect_timeout_secs: 1,
            ..Default::default()
        });
        let req: AgentRequest = serde_json::from_str(r#"{"messages":[{"role":"user","content":"hi"}]}"#).unwrap();
        assert!(client.passthrough(&req).await.is_err());
        assert!(client.complete(&req).await.is_err());
    }

    #[tokio::test]
    async fn broken_stream_ends_with_error_event() {
        let chunks: Vec<Result<&'static [u8], String>> =
            vec![Ok(b"data: {\"a\":1}\n\n".as_slice()), Err("reset by peer".to_string()), Ok(b"late".as_slice())];
        let out: Vec<Vec<u8>> = relay_bytes(stream::iter(chunks)).map(|r| r.unwrap()).collect().await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], b"data: {\"a\":1}\n\n".to_vec());
        assert_eq!(String::from_utf8(out[1].clone()).unwrap(), "data: {\"error\":\"ZeroClaw connection failed\"}\n\n");
    }
}
