//! Debounced draft persistence.
//!
//! Every update restarts the countdown; only the content present when the
//! countdown finally runs out is saved. Saves are skipped when the content is
//! blank or identical to the last successful save.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Sleep, sleep};
use tracing::{debug, warn};

use crate::db::Store;
use crate::models::essay::NewEssay;

/// How long a successful save stays reported before returning to idle.
pub const SAVED_STATUS_TTL: Duration = Duration::from_secs(3);

/// How long a failed save stays reported before returning to idle.
pub const ERROR_STATUS_TTL: Duration = Duration::from_secs(5);

/// Stands in for "never" on an unarmed timer.
const PARKED: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Parses "30", "30s", "45 seconds", "2m", "5 minutes" and friends.
pub fn parse_frequency(input: &str) -> Result<Duration> {
    let normalized = input.trim().to_ascii_lowercase();
    let split = normalized
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(normalized.len());
    let (number, unit) = normalized.split_at(split);

    let value: u64 = number
        .parse()
        .with_context(|| format!("Frequency must start with a number: {input:?}"))?;

    let seconds = match unit.trim() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => value,
        "m" | "min" | "mins" | "minute" | "minutes" => value
            .checked_mul(60)
            .ok_or_else(|| anyhow::anyhow!("Frequency is too large: {input:?}"))?,
        other => anyhow::bail!("Unknown frequency unit: {other:?}"),
    };

    if seconds == 0 {
        anyhow::bail!("Frequency must be greater than zero");
    }

    Ok(Duration::from_secs(seconds))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved,
    Error(String),
}

/// Destination for debounced drafts.
#[async_trait]
pub trait DraftSink: Send + Sync + 'static {
    async fn save(&self, content: &str) -> Result<()>;
}

/// Persists drafts as `Draft` essays owned by one user.
pub struct StoreDraftSink {
    store: Store,
    user_id: i32,
    topic: String,
}

impl StoreDraftSink {
    #[must_use]
    pub const fn new(store: Store, user_id: i32, topic: String) -> Self {
        Self {
            store,
            user_id,
            topic,
        }
    }
}

#[async_trait]
impl DraftSink for StoreDraftSink {
    async fn save(&self, content: &str) -> Result<()> {
        let essay = self
            .store
            .create_essay(NewEssay::draft(self.user_id, &self.topic, content))
            .await?;
        debug!(essay_id = essay.id, "Draft saved");
        Ok(())
    }
}

enum Command {
    Update(String),
    Flush(oneshot::Sender<()>),
}

pub struct AutoSaver {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<SaveStatus>,
    task: JoinHandle<()>,
}

impl AutoSaver {
    /// Starts the background task. Must be called inside a tokio runtime.
    pub fn spawn<S: DraftSink>(sink: S, delay: Duration) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(SaveStatus::Idle);

        let task = tokio::spawn(run(sink, delay, receiver, status_tx));

        Self {
            commands,
            status,
            task,
        }
    }

    /// Records new content and restarts the countdown.
    pub fn update(&self, content: impl Into<String>) {
        let _ = self.commands.send(Command::Update(content.into()));
    }

    /// Saves pending content now instead of waiting for the countdown.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.commands.send(Command::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }

    #[must_use]
    pub fn status(&self) -> watch::Receiver<SaveStatus> {
        self.status.clone()
    }
}

impl Drop for AutoSaver {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct SaveState<S> {
    sink: S,
    last_saved: Option<String>,
    status: watch::Sender<SaveStatus>,
}

impl<S: DraftSink> SaveState<S> {
    /// Returns how long the resulting status should be shown, or `None`
    /// when nothing was attempted.
    async fn persist(&mut self, content: String) -> Option<Duration> {
        if content.trim().is_empty() {
            debug!("Skipping autosave of blank content");
            return None;
        }
        if self.last_saved.as_deref() == Some(content.as_str()) {
            debug!("Skipping autosave, content unchanged");
            return None;
        }

        self.status.send_replace(SaveStatus::Saving);

        match self.sink.save(&content).await {
            Ok(()) => {
                self.last_saved = Some(content);
                self.status.send_replace(SaveStatus::Saved);
                Some(SAVED_STATUS_TTL)
            }
            Err(e) => {
                warn!("Autosave failed: {e:#}");
                self.status.send_replace(SaveStatus::Error(e.to_string()));
                Some(ERROR_STATUS_TTL)
            }
        }
    }
}

fn rearm(timer: std::pin::Pin<&mut Sleep>, after: Duration) {
    timer.reset(Instant::now() + after);
}

async fn run<S: DraftSink>(
    sink: S,
    delay: Duration,
    mut commands: mpsc::UnboundedReceiver<Command>,
    status: watch::Sender<SaveStatus>,
) {
    let mut state = SaveState {
        sink,
        last_saved: None,
        status,
    };
    let mut pending: Option<String> = None;

    let debounce = sleep(PARKED);
    let status_reset = sleep(PARKED);
    tokio::pin!(debounce, status_reset);
    let mut debounce_armed = false;
    let mut reset_armed = false;

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Update(content)) => {
                    pending = Some(content);
                    rearm(debounce.as_mut(), delay);
                    debounce_armed = true;
                }
                Some(Command::Flush(done)) => {
                    debounce_armed = false;
                    if let Some(content) = pending.take()
                        && let Some(ttl) = state.persist(content).await
                    {
                        rearm(status_reset.as_mut(), ttl);
                        reset_armed = true;
                    }
                    let _ = done.send(());
                }
                None => break,
            },
            () = &mut debounce, if debounce_armed => {
                debounce_armed = false;
                if let Some(content) = pending.take()
                    && let Some(ttl) = state.persist(content).await
                {
                    rearm(status_reset.as_mut(), ttl);
                    reset_armed = true;
                }
            }
            () = &mut status_reset, if reset_armed => {
                reset_armed = false;
                state.status.send_replace(SaveStatus::Idle);
            }
        }
    }
}
