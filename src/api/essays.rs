use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{
    require_topic_and_content, validate_essay_id, validate_limit, validate_score,
};
use super::{ApiError, ApiResponse, AppState, DeletedDto, EssayDto, EssaysPayload};
use crate::models::essay::{EssayKind, EssayQuery, EssaySort, NewEssay, SortOrder};

/// Numbers arrive as strings so malformed values get a JSON 400 rather than
/// an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct EssayListQuery {
    pub id: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub take: Option<String>,
    pub skip: Option<String>,
    #[serde(rename = "type")]
    pub essay_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEssayRequest {
    pub topic: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type", default)]
    pub essay_type: Option<String>,
    #[serde(default)]
    pub score: Option<i32>,
    #[serde(default)]
    pub feedback: Option<String>,
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::validation(format!("Invalid {name}: {raw:?}")))
}

fn parse_kind(raw: Option<&str>) -> Result<Option<EssayKind>, ApiError> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<EssayKind>().map_err(ApiError::validation))
        .transpose()
}

impl EssayListQuery {
    fn to_query(&self) -> Result<EssayQuery, ApiError> {
        let take = self
            .take
            .as_deref()
            .map(|raw| parse_number::<u64>("take", raw).and_then(validate_limit))
            .transpose()?;

        let skip = self
            .skip
            .as_deref()
            .map(|raw| parse_number::<u64>("skip", raw))
            .transpose()?
            .unwrap_or(0);

        Ok(EssayQuery {
            sort: EssaySort::parse_or_default(self.sort.as_deref()),
            order: SortOrder::parse_or_default(self.order.as_deref()),
            take,
            skip,
            kind: parse_kind(self.essay_type.as_deref())?,
        })
    }
}

/// GET /essays
/// A single essay (or null) when `id` is given, otherwise a listing
pub async fn list_essays(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<EssayListQuery>,
) -> Result<Json<ApiResponse<EssaysPayload>>, ApiError> {
    if let Some(raw_id) = params.id.as_deref() {
        let id = validate_essay_id(parse_number("essay ID", raw_id)?)?;
        let essay = state.store().get_essay(user.id, id).await?;
        return Ok(Json(ApiResponse::success(EssaysPayload::One(
            essay.map(EssayDto::from),
        ))));
    }

    let query = params.to_query()?;
    let essays = state.store().list_essays(user.id, &query).await?;

    Ok(Json(ApiResponse::success(EssaysPayload::Many(
        essays.into_iter().map(EssayDto::from).collect(),
    ))))
}

/// POST /essays
pub async fn create_essay(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<CreateEssayRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (topic, content) =
        require_topic_and_content(payload.topic.as_deref(), payload.content.as_deref())?;

    let kind = parse_kind(payload.essay_type.as_deref())?.unwrap_or(EssayKind::Submission);
    let score = payload.score.map(validate_score).transpose()?.unwrap_or(0);

    let essay = state
        .store()
        .create_essay(NewEssay {
            user_id: user.id,
            topic: topic.to_string(),
            content: content.to_string(),
            kind,
            score,
            feedback: payload.feedback.unwrap_or_default(),
        })
        .await?;

    tracing::info!(essay_id = essay.id, kind = %kind, "Essay saved");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(EssayDto::from(essay))),
    ))
}

/// DELETE /essays
/// Clears the caller's whole history, drafts included
pub async fn clear_essays(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<DeletedDto>>, ApiError> {
    let deleted = state.store().clear_essay_history(user.id).await?;

    tracing::info!(user_id = user.id, deleted, "Essay history cleared");

    Ok(Json(ApiResponse::success(DeletedDto { deleted })))
}
