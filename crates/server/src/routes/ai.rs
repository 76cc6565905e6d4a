use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::{Stream, StreamExt};
use serde_json::json;
use service::ai::{AiError, ChatRequest, DeltaStream};
use tracing::{info, warn};

use crate::errors::{AiRouteError, ApiJson};
use crate::state::AppState;

pub async fn chat(State(state): State<AppState>, ApiJson(req): ApiJson<ChatRequest>) -> Result<Response, AiRouteError> {
    serve_chat(&state, req).await
}

/// Direct LLM completion, streamed or not; also the ZeroClaw fallback path.
pub(crate) async fn serve_chat(state: &AppState, req: ChatRequest) -> Result<Response, AiRouteError> {
    state.llm.check_configured().map_err(AiRouteError::llm)?;
    req.validate().map_err(AiRouteError::llm)?;
    info!(messages = req.messages.len(), stream = req.stream, "ai chat request");

    if req.stream {
        let deltas = state.llm.open_stream(&req).await.map_err(AiRouteError::llm)?;
        return Ok(relay(deltas).into_response());
    }
    match state.llm.complete(&req).await {
        Ok(content) => Ok(Json(json!({ "content": content })).into_response()),
        Err(e @ AiError::NotConfigured(_)) => Err(AiRouteError::llm(e)),
        Err(e) => match state.llm.fallback_text() {
            Some(text) => {
                warn!(error = %e, "ai upstream failed; serving fallback text");
                Ok(Json(json!({ "content": text, "fallback": true })).into_response())
            }
            None => Err(AiRouteError::llm(e)),
        },
    }
}

/// Re-emit upstream deltas as `data: {"content": ...}` events, then `data: [DONE]`.
/// Dropping the response drops `deltas` and with it the upstream body.
fn relay(mut deltas: DeltaStream) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static> {
    let stream = async_stream::stream! {
        while let Some(item) = deltas.next().await {
            match item {
                Ok(text) => yield Ok::<Event, Infallible>(Event::default().data(json!({ "content": text }).to_string())),
                Err(e) => {
                    warn!(error = %e, "ai stream interrupted");
                    yield Ok(Event::default().data(json!({ "error": e.to_string() }).to_string()));
                    return;
                }
            }
        }
        yield Ok(Event::default().data("[DONE]"));
    };
    Sse::new(stream)
}
