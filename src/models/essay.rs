use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EssayKind {
    Draft,
    Submission,
}

impl EssayKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Submission => "Submission",
        }
    }
}

impl fmt::Display for EssayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EssayKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "submission" | "essay" | "submitted" => Ok(Self::Submission),
            other => Err(format!("Unknown essay type: {other}")),
        }
    }
}

/// Column an essay listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EssaySort {
    #[default]
    SubmittedAt,
    Score,
    Topic,
    Type,
    Id,
}

impl EssaySort {
    /// Unknown names fall back to submission time.
    #[must_use]
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("score") => Self::Score,
            Some("topic") => Self::Topic,
            Some("type" | "essayType" | "essay_type") => Self::Type,
            Some("id") => Self::Id,
            _ => Self::SubmittedAt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Anything other than `asc`/`desc` (any case) means descending.
    #[must_use]
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }
}

/// Listing parameters for a user's essays.
#[derive(Debug, Clone, Default)]
pub struct EssayQuery {
    pub sort: EssaySort,
    pub order: SortOrder,
    pub take: Option<u64>,
    pub skip: u64,
    pub kind: Option<EssayKind>,
}

#[derive(Debug, Clone)]
pub struct NewEssay {
    pub user_id: i32,
    pub topic: String,
    pub content: String,
    pub kind: EssayKind,
    pub score: i32,
    pub feedback: String,
}

impl NewEssay {
    #[must_use]
    pub fn draft(user_id: i32, topic: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            user_id,
            topic: topic.into(),
            content: content.into(),
            kind: EssayKind::Draft,
            score: 0,
            feedback: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Essay {
    pub id: i32,
    pub user_id: i32,
    pub topic: String,
    pub content: String,
    pub essay_type: String,
    pub score: i32,
    pub feedback: String,
    pub submitted_at: String,
}

impl Essay {
    #[must_use]
    pub fn word_count(&self) -> usize {
        word_count(&self.content)
    }

    #[must_use]
    pub fn is_draft(&self) -> bool {
        self.essay_type == EssayKind::Draft.as_str()
    }
}

#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
