use anyhow::Context;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::models::essay::{EssayKind, NewEssay};
use crate::services::ScoringOutcome;
use crate::state::SharedState;

pub async fn cmd_score(
    config: Config,
    topic: &str,
    file: &Path,
    save_as: Option<&str>,
) -> anyhow::Result<()> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    if content.trim().is_empty() {
        anyhow::bail!("{} is empty", file.display());
    }

    let state = Arc::new(SharedState::new(config).await?);

    if !state.llm.is_configured() {
        anyhow::bail!("No LLM API key configured. Set LLM_API_KEY or [llm].api_key");
    }

    println!("Scoring \"{topic}\" with {}...", state.llm.model());

    let result = match state.scoring.score(topic, &content).await {
        ScoringOutcome::Scored(result) => result,
        ScoringOutcome::Failed(_) => anyhow::bail!("Failed to score essay. Please try again."),
    };

    let subs = &result.sub_scores;
    println!();
    println!("Score: {}/100", result.score);
    println!("{:-<40}", "");
    println!("  Grammar         {:>3}/20", subs.grammar);
    println!("  Structure       {:>3}/20", subs.structure);
    println!("  Coherence       {:>3}/20", subs.coherence);
    println!("  Relevance       {:>3}/15", subs.relevance);
    println!("  Vocabulary      {:>3}/15", subs.vocabulary);
    println!("  Overused words  {:>3}/10", subs.overused_words);
    println!();
    println!("{}", result.explanation);

    if !result.suggestions.is_empty() {
        println!();
        println!("Suggestions:");
        for suggestion in &result.suggestions {
            println!("  - {suggestion}");
        }
    }

    if let Some(email) = save_as {
        let user = state
            .store
            .get_user_by_email(email)
            .await?
            .with_context(|| format!("No account for {email}"))?;

        let essay = state
            .store
            .create_essay(NewEssay {
                user_id: user.id,
                topic: topic.to_string(),
                content,
                kind: EssayKind::Submission,
                score: i32::try_from(result.score).unwrap_or(100),
                feedback: result.feedback_text(),
            })
            .await?;

        println!();
        println!("✓ Saved as essay {}", essay.id);
    }

    Ok(())
}
