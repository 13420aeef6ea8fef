use std::sync::Arc;

use tokio::sync::mpsc;

use super::{
    SessionError,
    context::SessionContext,
    countdown::{CountdownController, ResultsView, SubmitOutcome, TickOutcome},
    editor::AnswerEditor,
    schedule::{Cadences, ScheduledEvent, Scheduler},
};
use crate::{
    clients::{Evaluator, QuestionSource},
    config::SessionConfig,
    models::{draft::Answer, question::Question, session::SessionKey},
    store::{DraftStore, TimerStore},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Next,
    Previous,
    Jump(u32),
}

/// Input from the candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Answer { qno: u32, answer: Answer },
    ToggleReview { qno: u32 },
    Navigate(Navigation),
    Submit,
}

/// Everything [`ExamSession::apply`] reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Scheduled(ScheduledEvent),
    Command(SessionCommand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Submitted(ResultsView),
    /// The exam had already been handed in when the session was opened.
    AlreadySubmitted,
    /// Time ran out but the submission could not be sent.
    Aborted,
    /// The candidate left; the session stopped without submitting.
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub answered: usize,
    pub marked_for_review: usize,
    pub total: usize,
}

/// One candidate's attempt at one exam.
pub struct ExamSession {
    key: SessionKey,
    questions: Vec<Question>,
    cursor: usize,
    editor: AnswerEditor,
    countdown: CountdownController,
    cadences: Cadences,
}

impl ExamSession {
    /// Loads the exam selected in `context` and restores saved progress.
    pub async fn open<Q, S>(
        context: SessionContext,
        source: &Q,
        store: Arc<S>,
        evaluator: Arc<dyn Evaluator>,
        config: &SessionConfig,
    ) -> Result<Self, SessionError>
    where
        Q: QuestionSource + ?Sized,
        S: DraftStore + TimerStore + ?Sized + 'static,
    {
        let exam_id = context
            .exam_id()
            .ok_or(SessionError::MissingExamId)?
            .to_string();

        let mut questions = source.questions(&exam_id).await.map_err(|e| {
            tracing::error!("Error fetching questions for {}: {}", exam_id, e);
            SessionError::InvalidExamId(exam_id.clone())
        })?;
        if questions.is_empty() {
            return Err(SessionError::InvalidExamId(exam_id));
        }
        questions.sort_by_key(|q| q.qno);

        let key = context.session_key()?;
        tracing::info!("Opening exam {} ({} questions)", key, questions.len());

        let editor =
            AnswerEditor::load(key.clone(), &questions, Arc::clone(&store), config.retry).await;
        let countdown = CountdownController::seed(
            key.clone(),
            context,
            store,
            evaluator,
            config.default_duration,
            config.retry,
        )
        .await;

        Ok(Self {
            key,
            questions,
            cursor: 0,
            editor,
            countdown,
            cadences: config.cadences,
        })
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current(&self) -> &Question {
        &self.questions[self.cursor]
    }

    pub fn current_answer(&self) -> Option<&Answer> {
        self.editor.answer(self.current().qno)
    }

    pub fn editor(&self) -> &AnswerEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut AnswerEditor {
        &mut self.editor
    }

    pub fn countdown(&self) -> &CountdownController {
        &self.countdown
    }

    /// Moves to the next question. Stays put on the last one.
    pub fn next(&mut self) -> &Question {
        if self.cursor + 1 < self.questions.len() {
            self.cursor += 1;
        }
        self.current()
    }

    /// Moves to the previous question. Stays put on the first one.
    pub fn previous(&mut self) -> &Question {
        self.cursor = self.cursor.saturating_sub(1);
        self.current()
    }

    pub fn jump_to(&mut self, qno: u32) -> Result<&Question, SessionError> {
        self.cursor = self
            .questions
            .iter()
            .position(|q| q.qno == qno)
            .ok_or(SessionError::QuestionOutOfRange(qno))?;
        Ok(self.current())
    }

    pub fn progress(&self) -> Progress {
        Progress {
            answered: self.editor.answered_count(),
            marked_for_review: self.editor.review_count(),
            total: self.questions.len(),
        }
    }

    /// Applies one event to the session state.
    ///
    /// Returns `Some` once the session is over.
    pub async fn apply(&mut self, event: SessionEvent) -> Option<SessionOutcome> {
        match event {
            SessionEvent::Scheduled(ScheduledEvent::Tick) => match self.countdown.tick() {
                TickOutcome::Expired => {
                    tracing::info!("Time is up for {}", self.key);
                    match self.submit().await {
                        SubmitOutcome::Submitted(results) => {
                            Some(SessionOutcome::Submitted(results))
                        }
                        SubmitOutcome::Aborted => Some(SessionOutcome::Aborted),
                        SubmitOutcome::AlreadySubmitted => None,
                    }
                }
                TickOutcome::Running(_) | TickOutcome::Stopped => None,
            },
            SessionEvent::Scheduled(ScheduledEvent::SyncTimer) => {
                self.countdown.sync();
                None
            }
            SessionEvent::Scheduled(ScheduledEvent::AutosaveDraft) => {
                self.editor.autosave();
                None
            }
            SessionEvent::Command(command) => self.handle(command).await,
        }
    }

    /// Drives the session until it is submitted or `commands` closes.
    pub async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) -> SessionOutcome {
        if self.countdown.is_submitted() {
            tracing::info!("Session {} was already submitted", self.key);
            return SessionOutcome::AlreadySubmitted;
        }

        let mut scheduler = Scheduler::new(self.cadences);

        loop {
            let event = tokio::select! {
                scheduled = scheduler.next() => SessionEvent::Scheduled(scheduled),
                command = commands.recv() => match command {
                    Some(command) => SessionEvent::Command(command),
                    None => {
                        tracing::info!("Session {} closed before submission", self.key);
                        return SessionOutcome::Closed;
                    }
                },
            };

            if let Some(outcome) = self.apply(event).await {
                return outcome;
            }
        }
    }

    async fn handle(&mut self, command: SessionCommand) -> Option<SessionOutcome> {
        let result = match command {
            SessionCommand::Answer { qno, answer } => self.editor.set_answer(qno, answer),
            SessionCommand::ToggleReview { qno } => self.editor.toggle_review(qno).map(|_| ()),
            SessionCommand::Navigate(Navigation::Next) => {
                self.next();
                Ok(())
            }
            SessionCommand::Navigate(Navigation::Previous) => {
                self.previous();
                Ok(())
            }
            SessionCommand::Navigate(Navigation::Jump(qno)) => self.jump_to(qno).map(|_| ()),
            SessionCommand::Submit => {
                return match self.submit().await {
                    SubmitOutcome::Submitted(results) => Some(SessionOutcome::Submitted(results)),
                    SubmitOutcome::AlreadySubmitted | SubmitOutcome::Aborted => None,
                };
            }
        };

        if let Err(e) = result {
            tracing::warn!("Rejected input for {}: {}", self.key, e);
        }
        None
    }

    /// Persists the answer sheet, then hands over to the countdown's
    /// submission sequence so grading sees the final answers.
    pub async fn submit(&mut self) -> SubmitOutcome {
        if self.countdown.is_submitted() {
            return SubmitOutcome::AlreadySubmitted;
        }

        let status = self.editor.flush().await;
        if status.is_failed() {
            tracing::error!("Final draft save for {} failed: {:?}", self.key, status);
        }
        self.countdown.submit().await
    }
}
