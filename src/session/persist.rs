use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::store::{StoreError, StoreResult};

/// Bounded retry with exponential backoff for store writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero behaves as one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// A policy that tries once and gives up.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before attempt `attempt + 1`, for a 1-based `attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Runs `op` until it succeeds, fails permanently, or attempts run out.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> StoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() || attempt >= max_attempts => return Err(e),
                Err(e) => {
                    let delay = self.backoff(attempt);
                    tracing::warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        label,
                        attempt,
                        max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Outcome of the most recent background save, for display to the candidate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved { at: DateTime<Utc> },
    Failed { error: String },
}

impl SaveStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, SaveStatus::Failed { .. })
    }
}

type Snapshot<T> = Option<(u64, T)>;

/// Background writer that persists the latest snapshot of some state.
///
/// Snapshots are coalesced: if several are queued while a save is running,
/// only the newest is written next. Writes happen in queue order, so an older
/// snapshot never lands after a newer one. Dropping the saver stops the
/// worker once its current save finishes.
pub struct Autosaver<T> {
    label: &'static str,
    snapshots: watch::Sender<Snapshot<T>>,
    completed: watch::Receiver<u64>,
    status: watch::Receiver<SaveStatus>,
    generation: AtomicU64,
    worker: JoinHandle<()>,
}

impl<T> Autosaver<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn spawn<F, Fut>(label: &'static str, policy: RetryPolicy, save: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StoreResult<()>> + Send + 'static,
    {
        let (snapshots, snapshot_rx) = watch::channel(None);
        let (completed_tx, completed) = watch::channel(0);
        let (status_tx, status) = watch::channel(SaveStatus::Idle);

        let save = Arc::new(save);
        let worker = tokio::spawn(async move {
            let mut snapshot_rx = snapshot_rx;
            while snapshot_rx.changed().await.is_ok() {
                let latest: Snapshot<T> = snapshot_rx.borrow_and_update().clone();
                let Some((generation, snapshot)) = latest else {
                    continue;
                };

                status_tx.send_replace(SaveStatus::Saving);
                let result = policy
                    .run(label, || {
                        let save = Arc::clone(&save);
                        let snapshot = snapshot.clone();
                        async move { save(snapshot).await }
                    })
                    .await;

                let status = match result {
                    Ok(()) => SaveStatus::Saved { at: Utc::now() },
                    Err(e) => {
                        tracing::error!("{} gave up: {}", label, e);
                        SaveStatus::Failed {
                            error: e.to_string(),
                        }
                    }
                };
                status_tx.send_replace(status);
                completed_tx.send_replace(generation);
            }
            tracing::debug!("{} worker stopped", label);
        });

        Self {
            label,
            snapshots,
            completed,
            status,
            generation: AtomicU64::new(0),
            worker,
        }
    }

    /// Queues a snapshot without waiting for it to be written.
    pub fn enqueue(&self, snapshot: T) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        self.snapshots.send_replace(Some((generation, snapshot)));
        generation
    }

    /// Queues a snapshot and waits until it (or a newer one) has been handled.
    pub async fn flush(&self, snapshot: T) -> SaveStatus {
        let generation = self.enqueue(snapshot);
        let mut completed = self.completed.clone();

        if completed.wait_for(|done| *done >= generation).await.is_err() {
            return SaveStatus::Failed {
                error: StoreError::Unavailable(format!("{} worker stopped", self.label)).to_string(),
            };
        }
        self.status.borrow().clone()
    }

    pub fn status(&self) -> watch::Receiver<SaveStatus> {
        self.status.clone()
    }

    pub fn current_status(&self) -> SaveStatus {
        self.status.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        !self.worker.is_finished()
    }
}
