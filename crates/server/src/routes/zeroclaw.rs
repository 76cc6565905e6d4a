use axum::body::Body;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use service::ai::{AgentRequest, AiError};
use tracing::{info, warn};

use super::ai::serve_chat;
use crate::errors::{AiRouteError, ApiJson};
use crate::state::AppState;

pub async fn agent(State(state): State<AppState>, ApiJson(req): ApiJson<AgentRequest>) -> Result<Response, AiRouteError> {
    req.validate().map_err(AiRouteError::llm)?;
    info!(agent = req.agent_id.as_deref().unwrap_or("default"), stream = req.stream, "zeroclaw agent request");
    let result = if req.stream {
        state.agent.passthrough(&req).await.map(|bytes| {
            (
                [(CONTENT_TYPE, "text/event-stream; charset=utf-8"), (CACHE_CONTROL, "no-cache")],
                Body::from_stream(bytes),
            )
                .into_response()
        })
    } else {
        state
            .agent
            .complete(&req)
            .await
            .map(|content| Json(json!({ "content": content })).into_response())
    };
    match result {
        Ok(resp) => Ok(resp),
        Err(e) => unavailable(&state, req, e).await,
    }
}

async fn unavailable(state: &AppState, req: AgentRequest, e: AiError) -> Result<Response, AiRouteError> {
    if state.agent.fallback_to_llm() && state.llm.is_configured() {
        warn!(error = %e, "zeroclaw unavailable; falling back to direct llm");
        return serve_chat(state, req.to_chat()).await;
    }
    warn!(error = %e, "zeroclaw unavailable");
    Err(AiRouteError::Agent(e.to_string()))
}
