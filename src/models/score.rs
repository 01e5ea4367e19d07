use serde::Serialize;

/// Maximum points for each sub-score; they sum to 100.
pub mod maxima {
    pub const GRAMMAR: u32 = 20;
    pub const STRUCTURE: u32 = 20;
    pub const COHERENCE: u32 = 20;
    pub const RELEVANCE: u32 = 15;
    pub const VOCABULARY: u32 = 15;
    pub const OVERUSED_WORDS: u32 = 10;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SubScores {
    pub grammar: u32,
    pub structure: u32,
    pub coherence: u32,
    pub relevance: u32,
    pub vocabulary: u32,
    pub overused_words: u32,
}

impl SubScores {
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.grammar
            + self.structure
            + self.coherence
            + self.relevance
            + self.vocabulary
            + self.overused_words
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EssayScore {
    pub score: u32,
    pub sub_scores: SubScores,
    pub explanation: String,
    pub suggestions: Vec<String>,
}

impl EssayScore {
    #[must_use]
    pub fn new(sub_scores: SubScores, explanation: String, suggestions: Vec<String>) -> Self {
        Self {
            score: sub_scores.total(),
            sub_scores,
            explanation,
            suggestions,
        }
    }

    /// Result reported when the model reply could not be used.
    #[must_use]
    pub fn failed() -> Self {
        Self::new(
            SubScores::default(),
            "The essay could not be scored. Please try again.".to_string(),
            Vec::new(),
        )
    }

    /// Feedback text persisted alongside a scored essay.
    #[must_use]
    pub fn feedback_text(&self) -> String {
        if self.suggestions.is_empty() {
            return self.explanation.clone();
        }

        let mut text = self.explanation.clone();
        text.push_str("\n\nSuggestions:");
        for suggestion in &self.suggestions {
            text.push_str("\n- ");
            text.push_str(suggestion);
        }
        text
    }
}
