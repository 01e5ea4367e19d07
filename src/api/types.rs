use serde::Serialize;

use crate::models::essay::Essay;
use crate::models::score::EssayScore;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EssayDto {
    pub id: i32,
    pub topic: String,
    pub content: String,
    #[serde(rename = "type")]
    pub essay_type: String,
    pub score: i32,
    pub feedback: String,
    pub submitted_at: String,
    pub word_count: usize,
}

impl From<Essay> for EssayDto {
    fn from(essay: Essay) -> Self {
        Self {
            word_count: essay.word_count(),
            id: essay.id,
            topic: essay.topic,
            content: essay.content,
            essay_type: essay.essay_type,
            score: essay.score,
            feedback: essay.feedback,
            submitted_at: essay.submitted_at,
        }
    }
}

/// `GET /essays` answers with one essay (or null) when `id` is given,
/// otherwise with a list.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum EssaysPayload {
    One(Option<EssayDto>),
    Many(Vec<EssayDto>),
}

#[derive(Debug, Serialize)]
pub struct DeletedDto {
    pub deleted: u64,
}

#[derive(Debug, Serialize)]
pub struct ScoreResultDto {
    #[serde(flatten)]
    pub result: EssayScore,
    /// Set when the scored essay was saved
    pub essay_id: Option<i32>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ScorePointDto {
    pub essay_id: i32,
    pub topic: String,
    pub score: i32,
    pub submitted_at: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct EssayStatsDto {
    pub total_essays: u64,
    pub total_drafts: u64,
    pub average_score: f64,
    pub highest_score: Option<i32>,
    pub lowest_score: Option<i32>,
    pub latest_score: Option<i32>,
    pub total_words: u64,
    pub average_words: f64,
    /// Oldest first
    pub recent_scores: Vec<ScorePointDto>,
}

#[derive(Debug, Serialize)]
pub struct ApiKeyDto {
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub version: String,
    pub uptime: u64,
    pub database: bool,
}

#[derive(Debug, Serialize)]
pub struct LlmStatusDto {
    pub configured: bool,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Serialize)]
pub struct LlmProbeDto {
    pub model: String,
    pub reply: String,
    pub latency_ms: u64,
}
