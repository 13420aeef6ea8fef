use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::watch;

use super::SessionError;
use super::persist::{Autosaver, RetryPolicy, SaveStatus};
use crate::models::{
    draft::{Answer, AnswerEntry},
    question::{Question, QuestionKind},
    session::SessionKey,
};
use crate::store::DraftStore;

/// What the editor needs to know about a question to accept answers for it.
#[derive(Debug, Clone)]
struct Slot {
    qno: u32,
    kind: QuestionKind,
    options: Vec<String>,
}

/// In-memory answer sheet with draft autosave.
///
/// Every mutation queues the whole sheet for the draft store; the periodic
/// [`autosave`](Self::autosave) re-queues it even when nothing changed.
pub struct AnswerEditor {
    slots: Vec<Slot>,
    answers: Vec<AnswerEntry>,
    saver: Autosaver<Vec<AnswerEntry>>,
}

impl AnswerEditor {
    /// Builds the sheet for `questions` and restores any saved draft.
    ///
    /// Draft entries replace the fresh entry with the same `qno`. A missing
    /// draft, or one that cannot be fetched, leaves the fresh sheet.
    pub async fn load<S>(
        key: SessionKey,
        questions: &[Question],
        store: Arc<S>,
        policy: RetryPolicy,
    ) -> Self
    where
        S: DraftStore + ?Sized + 'static,
    {
        let slots: Vec<Slot> = questions
            .iter()
            .map(|q| Slot {
                qno: q.qno,
                kind: q.kind(),
                options: q.qoptions.clone(),
            })
            .collect();

        let mut answers: Vec<AnswerEntry> = questions
            .iter()
            .zip(&slots)
            .map(|(q, slot)| AnswerEntry {
                qno: q.qno,
                qid: q.id.clone(),
                review: false,
                answer: empty_answer(slot.kind),
            })
            .collect();

        match store.get_draft(&key).await {
            Ok(Some(draft)) => {
                let mut restored = 0;
                for saved in draft.answer_data {
                    if let Some(index) = slots.iter().position(|s| s.qno == saved.qno) {
                        let kind = slots[index].kind;
                        answers[index] = AnswerEntry {
                            answer: normalize(kind, saved.answer),
                            ..saved
                        };
                        restored += 1;
                    }
                }
                tracing::info!("Restored {} answers for {}", restored, key);
            }
            Ok(None) => tracing::debug!("No draft for {}", key),
            Err(e) => tracing::error!("Error fetching draft for {}: {}", key, e),
        }

        let saver = Autosaver::spawn("draft save", policy, move |answers| {
            let store = Arc::clone(&store);
            let key = key.clone();
            async move {
                store
                    .put_draft(&key, answers, chrono::Utc::now())
                    .await
                    .map(|_| ())
            }
        });

        Self {
            slots,
            answers,
            saver,
        }
    }

    pub fn answers(&self) -> &[AnswerEntry] {
        &self.answers
    }

    pub fn entry(&self, qno: u32) -> Option<&AnswerEntry> {
        self.index_of(qno).ok().map(|i| &self.answers[i])
    }

    pub fn answer(&self, qno: u32) -> Option<&Answer> {
        self.entry(qno).map(|e| &e.answer)
    }

    /// Replaces the answer of question `qno`.
    ///
    /// The shape must match the question: a set for multi-select, a string
    /// otherwise. Choice answers must name offered options.
    pub fn set_answer(&mut self, qno: u32, answer: Answer) -> Result<(), SessionError> {
        let index = self.index_of(qno)?;
        let slot = &self.slots[index];

        match (slot.kind, &answer) {
            (QuestionKind::MultiSelect, Answer::Choices(choices)) => {
                for choice in choices {
                    check_option(slot, choice)?;
                }
            }
            (QuestionKind::SingleSelect, Answer::Text(choice)) if !choice.is_empty() => {
                check_option(slot, choice)?;
            }
            (QuestionKind::SingleSelect | QuestionKind::FreeText | QuestionKind::Code, Answer::Text(_)) => {}
            _ => return Err(SessionError::AnswerShapeMismatch { qno }),
        }

        self.answers[index].answer = answer;
        self.save_now();
        Ok(())
    }

    /// Free text and code input.
    pub fn write_text(&mut self, qno: u32, text: impl Into<String>) -> Result<(), SessionError> {
        self.set_answer(qno, Answer::Text(text.into()))
    }

    /// Radio input: picks exactly one option.
    pub fn select_choice(&mut self, qno: u32, option: &str) -> Result<(), SessionError> {
        self.set_answer(qno, Answer::Text(option.to_string()))
    }

    /// Checkbox input: adds or removes one option.
    pub fn toggle_choice(&mut self, qno: u32, option: &str) -> Result<(), SessionError> {
        let index = self.index_of(qno)?;
        let mut choices = match &self.answers[index].answer {
            Answer::Choices(choices) => choices.clone(),
            Answer::Text(_) => BTreeSet::new(),
        };

        if !choices.remove(option) {
            choices.insert(option.to_string());
        }
        self.set_answer(qno, Answer::Choices(choices))
    }

    /// Flips the "marked for review" flag and returns the new value.
    pub fn toggle_review(&mut self, qno: u32) -> Result<bool, SessionError> {
        let index = self.index_of(qno)?;
        let entry = &mut self.answers[index];
        entry.review = !entry.review;
        let review = entry.review;
        self.save_now();
        Ok(review)
    }

    /// Safety-net save of the current sheet.
    pub fn autosave(&self) {
        self.save_now();
    }

    /// Saves the current sheet and waits for the outcome.
    pub async fn flush(&self) -> SaveStatus {
        self.saver.flush(self.answers.clone()).await
    }

    pub fn save_status(&self) -> watch::Receiver<SaveStatus> {
        self.saver.status()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|e| !e.answer.is_blank()).count()
    }

    pub fn review_count(&self) -> usize {
        self.answers.iter().filter(|e| e.review).count()
    }

    fn save_now(&self) {
        self.saver.enqueue(self.answers.clone());
    }

    fn index_of(&self, qno: u32) -> Result<usize, SessionError> {
        self.slots
            .iter()
            .position(|s| s.qno == qno)
            .ok_or(SessionError::QuestionOutOfRange(qno))
    }
}

fn empty_answer(kind: QuestionKind) -> Answer {
    match kind {
        QuestionKind::MultiSelect => Answer::Choices(BTreeSet::new()),
        _ => Answer::Text(String::new()),
    }
}

/// Coerces a stored answer into the shape the question expects.
///
/// Older drafts may hold `[]` or `["a"]` for single-select questions and a
/// bare string for multi-select ones.
fn normalize(kind: QuestionKind, answer: Answer) -> Answer {
    match (kind, answer) {
        (QuestionKind::MultiSelect, Answer::Text(text)) if text.is_empty() => {
            Answer::Choices(BTreeSet::new())
        }
        (QuestionKind::MultiSelect, Answer::Text(text)) => Answer::Choices(BTreeSet::from([text])),
        (QuestionKind::MultiSelect, choices) => choices,
        (_, Answer::Choices(choices)) => {
            Answer::Text(choices.into_iter().next().unwrap_or_default())
        }
        (_, text) => text,
    }
}

fn check_option(slot: &Slot, option: &str) -> Result<(), SessionError> {
    if slot.options.is_empty() || slot.options.iter().any(|o| o == option) {
        Ok(())
    } else {
        Err(SessionError::UnknownOption {
            qno: slot.qno,
            option: option.to_string(),
        })
    }
}
