use std::sync::Arc;

use tokio::sync::watch;

use super::context::SessionContext;
use super::persist::{Autosaver, RetryPolicy, SaveStatus};
use crate::clients::Evaluator;
use crate::models::{session::SessionKey, timer::RemainingTime};
use crate::store::TimerStore;

/// Where the candidate lands after submitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsView {
    pub exam_id: String,
}

impl ResultsView {
    /// Route serving the graded feedback for this exam.
    pub fn feedback_path(&self) -> String {
        format!("/api/exams/{}/feedback", self.exam_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running(RemainingTime),
    /// The countdown just reached 00:00:00.
    Expired,
    /// The exam was already submitted; the clock no longer moves.
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted(ResultsView),
    AlreadySubmitted,
    /// No exam id was available; nothing was evaluated.
    Aborted,
}

/// Exam countdown seeded from the timer store.
///
/// Ticks are driven externally (see [`Scheduler`](super::Scheduler)); the
/// controller only owns the clock value, the background timer saver and the
/// submission sequence. Submission happens at most once.
pub struct CountdownController {
    context: SessionContext,
    remaining: RemainingTime,
    submitted: bool,
    saver: Autosaver<RemainingTime>,
    evaluator: Arc<dyn Evaluator>,
}

impl CountdownController {
    /// Seeds the clock from the stored timer, or `default` when there is none.
    ///
    /// A failed lookup is logged and treated like a missing timer. A stored
    /// timer at 00:00:00 means the exam already expired and was handed in, so
    /// the controller starts out submitted.
    pub async fn seed<S>(
        key: SessionKey,
        context: SessionContext,
        store: Arc<S>,
        evaluator: Arc<dyn Evaluator>,
        default: RemainingTime,
        policy: RetryPolicy,
    ) -> Self
    where
        S: TimerStore + ?Sized + 'static,
    {
        let mut submitted = false;
        let remaining = match store.get_timer(&key).await {
            Ok(Some(record)) if record.remaining_time.is_zero() => {
                tracing::info!("Exam {} already expired; nothing left to submit", key);
                submitted = true;
                record.remaining_time
            }
            Ok(Some(record)) if record.remaining_time.is_valid() => {
                tracing::info!("Resuming {} at {}", key, record.remaining_time);
                record.remaining_time
            }
            Ok(Some(record)) => {
                tracing::warn!(
                    "Stored timer for {} is invalid ({}); starting at {}",
                    key,
                    record.remaining_time,
                    default
                );
                default
            }
            Ok(None) => {
                tracing::info!("No timer stored for {}; starting at {}", key, default);
                default
            }
            Err(e) => {
                tracing::error!("Error fetching timer for {}: {}; starting at {}", key, e, default);
                default
            }
        };

        let saver = Autosaver::spawn("timer sync", policy, move |remaining| {
            let store = Arc::clone(&store);
            let key = key.clone();
            async move { store.put_timer(&key, remaining).await.map(|_| ()) }
        });

        Self {
            context,
            remaining,
            submitted,
            saver,
            evaluator,
        }
    }

    pub fn remaining(&self) -> RemainingTime {
        self.remaining
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Advances the clock by one second.
    pub fn tick(&mut self) -> TickOutcome {
        if self.submitted {
            return TickOutcome::Stopped;
        }

        self.remaining = self.remaining.tick();
        if self.remaining.is_zero() {
            TickOutcome::Expired
        } else {
            TickOutcome::Running(self.remaining)
        }
    }

    /// Queues the current value for the timer store without waiting.
    pub fn sync(&self) {
        if !self.submitted {
            self.saver.enqueue(self.remaining);
        }
    }

    /// Runs the submission sequence: final timer push, evaluation, transition.
    ///
    /// Evaluation failures are logged and do not prevent the transition.
    pub async fn submit(&mut self) -> SubmitOutcome {
        if self.submitted {
            tracing::debug!("Submit ignored: exam already submitted");
            return SubmitOutcome::AlreadySubmitted;
        }

        if let SaveStatus::Failed { error } = self.saver.flush(self.remaining).await {
            tracing::error!("Final timer save failed: {}", error);
        }

        let Some(exam_id) = self.context.exam_id().map(str::to_string) else {
            tracing::error!("Exam ID not found in session context; submission aborted");
            return SubmitOutcome::Aborted;
        };

        match self.evaluator.evaluate(&exam_id).await {
            Ok(summary) => tracing::info!("Evaluation for {}: {}", exam_id, summary.status),
            Err(e) => tracing::error!("Error while submitting answers for {}: {}", exam_id, e),
        }

        self.submitted = true;
        SubmitOutcome::Submitted(ResultsView { exam_id })
    }

    pub fn save_status(&self) -> watch::Receiver<SaveStatus> {
        self.saver.status()
    }
}
