use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{validate_draft_content, validate_limit};
use super::{ApiError, ApiResponse, AppState, EssayDto};
use crate::models::essay::{EssayKind, NewEssay};

const UNTITLED: &str = "Untitled";

#[derive(Debug, Deserialize)]
pub struct AutosaveRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(rename = "type", default)]
    pub essay_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DraftsQuery {
    pub limit: Option<u64>,
}

/// POST /autosave
pub async fn save_draft(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<AutosaveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let min_length = state.config().autosave.min_content_length;
    let content = validate_draft_content(&payload.content, min_length)?;

    // Only drafts go through autosave
    if let Some(raw) = payload.essay_type.as_deref().filter(|s| !s.trim().is_empty()) {
        let kind = raw.parse::<EssayKind>().map_err(ApiError::validation)?;
        if kind != EssayKind::Draft {
            return Err(ApiError::validation("Autosave only stores drafts"));
        }
    }

    let topic = payload
        .topic
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(UNTITLED);

    let essay = state
        .store()
        .create_essay(NewEssay::draft(user.id, topic, content))
        .await?;

    tracing::debug!(essay_id = essay.id, "Autosaved draft");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(EssayDto::from(essay))),
    ))
}

/// GET /autosave
/// Most recent drafts, newest first
pub async fn list_drafts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<DraftsQuery>,
) -> Result<Json<ApiResponse<Vec<EssayDto>>>, ApiError> {
    let limit = match query.limit {
        Some(limit) => validate_limit(limit)?,
        None => state.config().autosave.default_draft_limit,
    };

    let drafts = state.store().recent_drafts(user.id, limit).await?;

    Ok(Json(ApiResponse::success(
        drafts.into_iter().map(EssayDto::from).collect(),
    )))
}
