//! Upsert stores for in-progress exam state.
//!
//! Both stores are keyed by [`SessionKey`]. `put` is an unconditional
//! create-or-replace; `get` on an unknown key yields `Ok(None)`.

use async_trait::async_trait;

use crate::models::{
    draft::{AnswerEntry, DraftRecord},
    session::SessionKey,
    timer::{RemainingTime, TimerRecord},
};

pub mod memory;
pub mod postgres;

pub use memory::MemorySessionStore;
pub use postgres::PgSessionStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The payload was malformed or missing a required field.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The backing store could not be reached or rejected the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be decoded into a record.
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Validation failures are permanent; everything else is worth retrying.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, StoreError::Validation(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn get_draft(&self, key: &SessionKey) -> StoreResult<Option<DraftRecord>>;

    async fn put_draft(
        &self,
        key: &SessionKey,
        answer_data: Vec<AnswerEntry>,
        timestamp: chrono::DateTime<chrono::Utc>,
    ) -> StoreResult<DraftRecord>;
}

#[async_trait]
pub trait TimerStore: Send + Sync {
    async fn get_timer(&self, key: &SessionKey) -> StoreResult<Option<TimerRecord>>;

    async fn put_timer(&self, key: &SessionKey, remaining: RemainingTime) -> StoreResult<TimerRecord>;
}

/// Both stores behind one handle, as the server wires them.
pub trait SessionStore: DraftStore + TimerStore {}

impl<T: DraftStore + TimerStore> SessionStore for T {}

pub(crate) fn check_remaining(remaining: &RemainingTime) -> StoreResult<()> {
    if !remaining.is_valid() {
        return Err(StoreError::Validation(format!(
            "remainingTime {} is not a valid HH:MM:SS value",
            remaining
        )));
    }
    Ok(())
}

#[async_trait]
impl<S: DraftStore + ?Sized> DraftStore for std::sync::Arc<S> {
    async fn get_draft(&self, key: &SessionKey) -> StoreResult<Option<DraftRecord>> {
        (**self).get_draft(key).await
    }

    async fn put_draft(
        &self,
        key: &SessionKey,
        answer_data: Vec<AnswerEntry>,
        timestamp: chrono::DateTime<chrono::Utc>,
    ) -> StoreResult<DraftRecord> {
        (**self).put_draft(key, answer_data, timestamp).await
    }
}

#[async_trait]
impl<S: TimerStore + ?Sized> TimerStore for std::sync::Arc<S> {
    async fn get_timer(&self, key: &SessionKey) -> StoreResult<Option<TimerRecord>> {
        (**self).get_timer(key).await
    }

    async fn put_timer(&self, key: &SessionKey, remaining: RemainingTime) -> StoreResult<TimerRecord> {
        (**self).put_timer(key, remaining).await
    }
}
