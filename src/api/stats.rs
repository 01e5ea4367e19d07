use axum::{
    Extension, Json,
    extract::State,
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, EssayStatsDto, ScorePointDto};
use crate::models::essay::{Essay, EssayKind, EssayQuery, EssaySort, SortOrder};

const RECENT_SCORES: usize = 10;

/// GET /metrics
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<EssayStatsDto>>, ApiError> {
    let query = EssayQuery {
        sort: EssaySort::SubmittedAt,
        order: SortOrder::Asc,
        kind: Some(EssayKind::Submission),
        ..Default::default()
    };

    let essays = state.store().list_essays(user.id, &query).await?;
    let drafts = state
        .store()
        .count_essays(user.id, Some(EssayKind::Draft))
        .await?;

    Ok(Json(ApiResponse::success(summarize(&essays, drafts))))
}

/// `essays` must be submissions ordered oldest first.
#[allow(clippy::cast_precision_loss)]
pub fn summarize(essays: &[Essay], total_drafts: u64) -> EssayStatsDto {
    let total_essays = essays.len() as u64;
    let scores: Vec<i32> = essays.iter().map(|e| e.score).collect();
    let total_words: u64 = essays.iter().map(|e| e.word_count() as u64).sum();

    let average = |sum: f64| {
        if essays.is_empty() {
            0.0
        } else {
            (sum / essays.len() as f64 * 10.0).round() / 10.0
        }
    };

    let recent_scores = essays
        .iter()
        .skip(essays.len().saturating_sub(RECENT_SCORES))
        .map(|e| ScorePointDto {
            essay_id: e.id,
            topic: e.topic.clone(),
            score: e.score,
            submitted_at: e.submitted_at.clone(),
        })
        .collect();

    EssayStatsDto {
        total_essays,
        total_drafts,
        average_score: average(scores.iter().map(|&s| f64::from(s)).sum()),
        highest_score: scores.iter().copied().max(),
        lowest_score: scores.iter().copied().min(),
        latest_score: scores.last().copied(),
        total_words,
        average_words: average(total_words as f64),
        recent_scores,
    }
}
