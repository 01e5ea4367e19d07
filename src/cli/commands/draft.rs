use anyhow::Context;
use std::path::Path;
use std::time::Duration;
use tokio::signal;
use tracing::info;

use crate::config::Config;
use crate::db::Store;
use crate::services::autosave::parse_frequency;
use crate::services::{AutoSaver, SaveStatus, StoreDraftSink};

/// How often the watched file is re-read.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

pub async fn cmd_draft(
    config: &Config,
    email: &str,
    file: &Path,
    topic: &str,
    every: Option<&str>,
) -> anyhow::Result<()> {
    let delay = parse_frequency(every.unwrap_or(&config.autosave.frequency))?;

    let store = Store::new(&config.general.database_url).await?;
    let user = store
        .get_user_by_email(email)
        .await?
        .with_context(|| format!("No account for {email}"))?;

    let saver = AutoSaver::spawn(
        StoreDraftSink::new(store, user.id, topic.to_string()),
        delay,
    );
    let mut status = saver.status();

    println!(
        "Watching {} (saving {}s after the last change). Press Ctrl+C to stop.",
        file.display(),
        delay.as_secs()
    );

    let mut last_seen: Option<String> = None;
    let mut poll = tokio::time::interval(POLL_INTERVAL);

    loop {
        tokio::select! {
            _ = poll.tick() => {
                // A missing file just means nothing to save yet
                let Ok(content) = tokio::fs::read_to_string(file).await else {
                    continue;
                };
                if last_seen.as_deref() != Some(content.as_str()) {
                    saver.update(content.clone());
                    last_seen = Some(content);
                }
            }
            Ok(()) = status.changed() => {
                match &*status.borrow_and_update() {
                    SaveStatus::Saving => println!("Saving..."),
                    SaveStatus::Saved => println!("✓ Saved"),
                    SaveStatus::Error(e) => println!("✗ Save failed: {e}"),
                    SaveStatus::Idle => {}
                }
            }
            result = signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl+C")?;
                break;
            }
        }
    }

    info!("Flushing pending draft before exit");
    saver.flush().await;

    if let SaveStatus::Error(e) = &*saver.status().borrow() {
        anyhow::bail!("Last save failed: {e}");
    }

    println!("Stopped.");
    Ok(())
}
