//! Essay scoring through a hosted chat-completion model.
//!
//! The model is asked for six sub-scores plus an explanation and suggestions,
//! returned as a JSON object somewhere in its reply. Only the first
//! brace-delimited span of the reply is considered.

use regex::Regex;
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{info, warn};

use crate::clients::llm::{ChatMessage, CompletionProvider};
use crate::models::score::{EssayScore, SubScores, maxima};

const SYSTEM_PROMPT: &str = "You are an experienced essay examiner. You grade essays strictly \
and fairly and always answer with a single JSON object and nothing else.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoringOutcome {
    Scored(EssayScore),
    /// The model could not be reached or its reply held no usable JSON.
    /// Carries the zeroed result.
    Failed(EssayScore),
}

impl ScoringOutcome {
    #[must_use]
    pub const fn score(&self) -> &EssayScore {
        match self {
            Self::Scored(score) | Self::Failed(score) => score,
        }
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

pub struct ScoringService {
    llm: Arc<dyn CompletionProvider>,
    delay: Duration,
}

impl ScoringService {
    #[must_use]
    pub fn new(llm: Arc<dyn CompletionProvider>, delay: Duration) -> Self {
        Self { llm, delay }
    }

    pub async fn score(&self, topic: &str, content: &str) -> ScoringOutcome {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let messages = build_messages(topic, content);

        let reply = match self.llm.complete(&messages).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(model = self.llm.model(), "Scoring request failed: {e:#}");
                return ScoringOutcome::Failed(EssayScore::failed());
            }
        };

        match parse_reply(&reply) {
            Some(score) => {
                info!(score = score.score, "Essay scored");
                ScoringOutcome::Scored(score)
            }
            None => {
                let snippet: String = reply.chars().take(200).collect();
                warn!("Scoring reply held no usable JSON object: {snippet}");
                ScoringOutcome::Failed(EssayScore::failed())
            }
        }
    }
}

#[must_use]
pub fn build_messages(topic: &str, content: &str) -> Vec<ChatMessage> {
    let prompt = format!(
        "Score the following essay written on the topic \"{topic}\".\n\
         \n\
         Award points in six categories, never exceeding the maximum shown:\n\
         - grammar: out of {grammar}\n\
         - structure: out of {structure}\n\
         - coherence: out of {coherence}\n\
         - relevance (to the topic): out of {relevance}\n\
         - vocabulary: out of {vocabulary}\n\
         - overusedWords (fewer repeated or filler words earns more): out of {overused}\n\
         \n\
         Respond with a JSON object of exactly this shape:\n\
         {{\"grammar\": 0, \"structure\": 0, \"coherence\": 0, \"relevance\": 0, \
         \"vocabulary\": 0, \"overusedWords\": 0, \
         \"explanation\": \"why the essay earned this score\", \
         \"suggestions\": [\"one concrete improvement\", \"another\"]}}\n\
         \n\
         Essay:\n\
         {content}",
        grammar = maxima::GRAMMAR,
        structure = maxima::STRUCTURE,
        coherence = maxima::COHERENCE,
        relevance = maxima::RELEVANCE,
        vocabulary = maxima::VOCABULARY,
        overused = maxima::OVERUSED_WORDS,
    );

    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)]
}

/// First `{` through last `}` of the text, if any.
#[must_use]
pub fn extract_json_object(text: &str) -> Option<&str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\{[\s\S]*\}").expect("Invalid regex"));
    re.find(text).map(|m| m.as_str())
}

#[must_use]
pub fn parse_reply(text: &str) -> Option<EssayScore> {
    let object: Value = serde_json::from_str(extract_json_object(text)?).ok()?;
    let object = object.as_object()?;

    // Some models nest the numbers under a "scores" key
    let scores = object
        .get("scores")
        .or_else(|| object.get("subScores"))
        .and_then(Value::as_object)
        .unwrap_or(object);

    let field = |names: &[&str], max: u32| {
        names
            .iter()
            .find_map(|name| scores.get(*name))
            .map_or(0, |value| clamp_points(value, max))
    };

    let sub_scores = SubScores {
        grammar: field(&["grammar"], maxima::GRAMMAR),
        structure: field(&["structure"], maxima::STRUCTURE),
        coherence: field(&["coherence"], maxima::COHERENCE),
        relevance: field(&["relevance"], maxima::RELEVANCE),
        vocabulary: field(&["vocabulary"], maxima::VOCABULARY),
        overused_words: field(
            &["overusedWords", "overused_words", "overused"],
            maxima::OVERUSED_WORDS,
        ),
    };

    let explanation = object
        .get("explanation")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();

    let suggestions = match object.get("suggestions") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(single)) if !single.trim().is_empty() => {
            vec![single.trim().to_string()]
        }
        _ => Vec::new(),
    };

    Some(EssayScore::new(sub_scores, explanation, suggestions))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_points(value: &Value, max: u32) -> u32 {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    number
        .filter(|n| n.is_finite())
        .map_or(0, |n| n.round().clamp(0.0, f64::from(max)) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;

    struct FixedReply(Result<String, String>);

    #[async_trait]
    impl CompletionProvider for FixedReply {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
            self.0.clone().map_err(|e| anyhow::anyhow!(e))
        }

        fn model(&self) -> &str {
            "fixed"
        }

        fn base_url(&self) -> &str {
            "http://localhost"
        }

        fn is_configured(&self) -> bool {
            true
        }
    }

    fn service(reply: Result<String, String>) -> ScoringService {
        ScoringService::new(Arc::new(FixedReply(reply)), Duration::ZERO)
    }

    const GOOD_REPLY: &str = r#"Here is my assessment:
{"grammar": 18, "structure": 15, "coherence": 17, "relevance": 12,
 "vocabulary": 11, "overusedWords": 7,
 "explanation": "Clear argument with minor slips.",
 "suggestions": ["Tighten the conclusion", "Avoid repeating 'very'"]}
Hope this helps!"#;

    #[test]
    fn test_extract_json_object_spans_first_to_last_brace() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("a {\"x\": {\"y\": 1}} b"), Some("{\"x\": {\"y\": 1}}"));
        assert_eq!(extract_json_object("{}\n{}"), Some("{}\n{}"));
    }

    #[test]
    fn test_parse_reply_sums_sub_scores() {
        let score = parse_reply(GOOD_REPLY).unwrap();
        assert_eq!(score.sub_scores.grammar, 18);
        assert_eq!(score.sub_scores.overused_words, 7);
        assert_eq!(score.score, 80);
        assert_eq!(score.explanation, "Clear argument with minor slips.");
        assert_eq!(score.suggestions.len(), 2);
    }

    #[test]
    fn test_parse_reply_clamps_and_coerces() {
        let score = parse_reply(
            r#"{"scores": {"grammar": 35, "structure": "12.6", "coherence": -4,
                "relevance": null, "vocabulary": 15, "overused_words": 3},
               "explanation": "ok", "suggestions": "Use paragraphs"}"#,
        )
        .unwrap();
        assert_eq!(score.sub_scores.grammar, 20);
        assert_eq!(score.sub_scores.structure, 13);
        assert_eq!(score.sub_scores.coherence, 0);
        assert_eq!(score.sub_scores.relevance, 0);
        assert_eq!(score.sub_scores.overused_words, 3);
        assert_eq!(score.score, 51);
        assert_eq!(score.suggestions, vec!["Use paragraphs".to_string()]);
    }

    #[test]
    fn test_parse_reply_rejects_malformed() {
        assert!(parse_reply("I cannot grade this essay.").is_none());
        assert!(parse_reply("{grammar: eighteen}").is_none());
        assert!(parse_reply("[1, 2, 3]").is_none());
    }

    #[test]
    fn test_prompt_mentions_topic_and_maxima() {
        let messages = build_messages("Climate policy", "Essay body");
        assert_eq!(messages.len(), 2);
        assert!(messages[1].content.contains("\"Climate policy\""));
        assert!(messages[1].content.contains("out of 15"));
        assert!(messages[1].content.ends_with("Essay body"));
    }

    #[tokio::test]
    async fn test_score_success() {
        let outcome = service(Ok(GOOD_REPLY.to_string()))
            .score("Topic", "Content")
            .await;
        assert!(!outcome.is_failed());
        assert_eq!(outcome.score().score, 80);
    }

    #[tokio::test]
    async fn test_score_without_json_fails_with_zeroes() {
        let outcome = service(Ok("Great essay, 9/10".to_string()))
            .score("Topic", "Content")
            .await;
        assert!(outcome.is_failed());
        assert_eq!(outcome.score().sub_scores, SubScores::default());
    }

    #[tokio::test]
    async fn test_score_provider_error_fails() {
        let outcome = service(Err("connection refused".to_string()))
            .score("Topic", "Content")
            .await;
        assert!(outcome.is_failed());
        assert_eq!(outcome.score().score, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_artificial_delay_is_applied() {
        let service = ScoringService::new(
            Arc::new(FixedReply(Ok(GOOD_REPLY.to_string()))),
            Duration::from_secs(2),
        );
        let started = tokio::time::Instant::now();
        service.score("Topic", "Content").await;
        assert!(started.elapsed() >= Duration::from_secs(2));
    }
}
