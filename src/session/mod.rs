//! The candidate-side exam session.
//!
//! An [`ExamSession`] loads the question set, restores the saved draft and
//! countdown, and then runs until the exam is submitted. All timed behaviour
//! comes from one [`Scheduler`]; persistence goes through [`Autosaver`]s so a
//! slow store never stalls the countdown.

pub mod context;
pub mod countdown;
pub mod editor;
pub mod persist;
pub mod schedule;
pub mod shell;

pub use context::{GUEST_USER, SessionContext};
pub use countdown::{CountdownController, ResultsView, SubmitOutcome, TickOutcome};
pub use editor::AnswerEditor;
pub use persist::{Autosaver, RetryPolicy, SaveStatus};
pub use schedule::{Cadences, ScheduledEvent, Scheduler};
pub use shell::{ExamSession, Navigation, Progress, SessionCommand, SessionEvent, SessionOutcome};

use crate::{clients::ClientError, store::StoreError};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No exam selected")]
    MissingExamId,

    #[error("Invalid Exam ID: {0}")]
    InvalidExamId(String),

    #[error("Question {0} is not part of this exam")]
    QuestionOutOfRange(u32),

    #[error("Question {qno} does not accept this kind of answer")]
    AnswerShapeMismatch { qno: u32 },

    #[error("Question {qno} has no option {option:?}")]
    UnknownOption { qno: u32, option: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Client(#[from] ClientError),
}
