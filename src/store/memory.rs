use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DraftStore, StoreResult, TimerStore, check_remaining};
use crate::models::{
    draft::{AnswerEntry, DraftRecord},
    session::SessionKey,
    timer::{RemainingTime, TimerRecord},
};

/// Process-local store. Used by tests and by local runs without Postgres.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    drafts: RwLock<HashMap<SessionKey, DraftRecord>>,
    timers: RwLock<HashMap<SessionKey, TimerRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DraftStore for MemorySessionStore {
    async fn get_draft(&self, key: &SessionKey) -> StoreResult<Option<DraftRecord>> {
        Ok(self.drafts.read().await.get(key).cloned())
    }

    async fn put_draft(
        &self,
        key: &SessionKey,
        answer_data: Vec<AnswerEntry>,
        timestamp: chrono::DateTime<chrono::Utc>,
    ) -> StoreResult<DraftRecord> {
        let record = DraftRecord {
            user_id: key.user_id.clone(),
            exam_id: key.exam_id.clone(),
            answer_data,
            timestamp,
        };
        self.drafts.write().await.insert(key.clone(), record.clone());
        Ok(record)
    }
}

#[async_trait]
impl TimerStore for MemorySessionStore {
    async fn get_timer(&self, key: &SessionKey) -> StoreResult<Option<TimerRecord>> {
        Ok(self.timers.read().await.get(key).cloned())
    }

    async fn put_timer(&self, key: &SessionKey, remaining: RemainingTime) -> StoreResult<TimerRecord> {
        check_remaining(&remaining)?;

        let record = TimerRecord {
            user_id: key.user_id.clone(),
            exam_id: key.exam_id.clone(),
            remaining_time: remaining,
            updated_at: chrono::Utc::now(),
        };
        self.timers.write().await.insert(key.clone(), record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::draft::Answer;

    fn key() -> SessionKey {
        SessionKey::new("alice", "exam-1").unwrap()
    }

    #[tokio::test]
    async fn unknown_keys_are_not_found() {
        let store = MemorySessionStore::new();
        assert!(store.get_draft(&key()).await.unwrap().is_none());
        assert!(store.get_timer(&key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn draft_put_replaces_without_merge() {
        let store = MemorySessionStore::new();
        let first = vec![
            AnswerEntry {
                qno: 0,
                qid: "q1".to_string(),
                review: false,
                answer: Answer::Text("a".to_string()),
            },
            AnswerEntry {
                qno: 1,
                qid: "q2".to_string(),
                review: true,
                answer: Answer::Text("b".to_string()),
            },
        ];
        store.put_draft(&key(), first, chrono::Utc::now()).await.unwrap();

        let second = vec![AnswerEntry {
            qno: 0,
            qid: "q1".to_string(),
            review: false,
            answer: Answer::Text("42".to_string()),
        }];
        store
            .put_draft(&key(), second.clone(), chrono::Utc::now())
            .await
            .unwrap();

        let stored = store.get_draft(&key()).await.unwrap().unwrap();
        assert_eq!(stored.answer_data, second);
    }

    #[tokio::test]
    async fn timer_put_rejects_invalid_triple() {
        let store = MemorySessionStore::new();
        let err = store
            .put_timer(&key(), RemainingTime::new(1, 60, 0))
            .await
            .unwrap_err();
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn timer_last_write_wins() {
        let store = MemorySessionStore::new();
        store.put_timer(&key(), RemainingTime::new(1, 0, 0)).await.unwrap();
        store.put_timer(&key(), RemainingTime::new(0, 42, 7)).await.unwrap();

        let stored = store.get_timer(&key()).await.unwrap().unwrap();
        assert_eq!(stored.remaining_time, RemainingTime::new(0, 42, 7));
        assert_eq!(stored.user_id, "alice");
    }
}
