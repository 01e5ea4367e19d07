use axum::{
    Extension, Json,
    extract::State,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;

use super::auth::CurrentUser;
use super::validation::require_topic_and_content;
use super::{ApiError, ApiResponse, AppState, ScoreResultDto};
use crate::models::essay::{EssayKind, NewEssay};
use crate::services::ScoringOutcome;

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub topic: Option<String>,
    pub content: Option<String>,
    /// Persist the scored essay as a submission
    #[serde(default)]
    pub save: bool,
}

/// POST /score
pub async fn score_essay(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<ScoreRequest>,
) -> Result<Json<ApiResponse<ScoreResultDto>>, ApiError> {
    let (topic, content) =
        require_topic_and_content(payload.topic.as_deref(), payload.content.as_deref())?;

    let start = Instant::now();
    let outcome = state.scoring().score(topic, content).await;

    let label = if outcome.is_failed() { "failed" } else { "scored" };
    metrics::counter!("essay_scoring_total", "outcome" => label).increment(1);
    metrics::histogram!("essay_scoring_duration_seconds").record(start.elapsed().as_secs_f64());

    let result = match outcome {
        ScoringOutcome::Scored(result) => result,
        ScoringOutcome::Failed(_) => return Err(ApiError::ScoringFailed),
    };

    let essay_id = if payload.save {
        let essay = state
            .store()
            .create_essay(NewEssay {
                user_id: user.id,
                topic: topic.to_string(),
                content: content.to_string(),
                kind: EssayKind::Submission,
                score: i32::try_from(result.score).unwrap_or(100),
                feedback: result.feedback_text(),
            })
            .await?;
        Some(essay.id)
    } else {
        None
    };

    Ok(Json(ApiResponse::success(ScoreResultDto { result, essay_id })))
}
