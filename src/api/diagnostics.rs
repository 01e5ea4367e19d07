use axum::{
    Json,
    body::Bytes,
    extract::State,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;

use super::{ApiError, ApiResponse, AppState, LlmProbeDto, LlmStatusDto};
use crate::clients::llm::ChatMessage;

const DEFAULT_PROBE_PROMPT: &str = "Reply with the single word: pong";

#[derive(Debug, Default, Deserialize)]
pub struct ProbeRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

/// GET /diagnostics/llm
pub async fn llm_status(State(state): State<Arc<AppState>>) -> Json<ApiResponse<LlmStatusDto>> {
    let llm = state.llm();
    Json(ApiResponse::success(LlmStatusDto {
        configured: llm.is_configured(),
        base_url: llm.base_url().to_string(),
        model: llm.model().to_string(),
    }))
}

/// POST /diagnostics/llm
/// Sends one prompt to the completion endpoint and reports the round trip
pub async fn probe_llm(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ApiResponse<LlmProbeDto>>, ApiError> {
    // An empty body means "use the default prompt"
    let payload: ProbeRequest = if body.is_empty() {
        ProbeRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::validation(format!("Invalid request body: {e}")))?
    };

    let prompt = payload
        .prompt
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PROBE_PROMPT.to_string());

    let llm = state.llm();
    let start = Instant::now();

    let reply = llm
        .complete(&[ChatMessage::user(prompt)])
        .await
        .map_err(|e| ApiError::llm_error(format!("{e:#}")))?;

    let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    tracing::info!(model = llm.model(), latency_ms, "LLM probe succeeded");

    Ok(Json(ApiResponse::success(LlmProbeDto {
        model: llm.model().to_string(),
        reply,
        latency_ms,
    })))
}
