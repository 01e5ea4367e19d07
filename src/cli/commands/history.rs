use anyhow::Context;

use crate::config::Config;
use crate::db::Store;
use crate::models::essay::{EssayKind, EssayQuery};

pub async fn cmd_history(
    config: &Config,
    email: &str,
    limit: u64,
    drafts_only: bool,
) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_url).await?;
    let user = store
        .get_user_by_email(email)
        .await?
        .with_context(|| format!("No account for {email}"))?;

    let query = EssayQuery {
        take: Some(limit.clamp(1, 1000)),
        kind: drafts_only.then_some(EssayKind::Draft),
        ..Default::default()
    };
    let essays = store.list_essays(user.id, &query).await?;

    if essays.is_empty() {
        println!("No essays yet.");
        return Ok(());
    }

    println!("Recent Essays (last {}):", essays.len());
    println!("{:-<70}", "");

    for essay in essays {
        if essay.is_draft() {
            println!("• [Draft] {}", essay.topic);
        } else {
            println!("• {} - {}/100", essay.topic, essay.score);
        }
        println!(
            "  ID: {} | {} words | {}",
            essay.id,
            essay.word_count(),
            essay.submitted_at
        );
    }

    Ok(())
}
