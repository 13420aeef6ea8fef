// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, types::Json};

use super::{DraftStore, StoreError, StoreResult, TimerStore, check_remaining};
use crate::models::{
    draft::{AnswerEntry, DraftRecord},
    session::SessionKey,
    timer::{RemainingTime, TimerRecord},
};

/// Postgres-backed draft and timer store.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies the schema in `./migrations`.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::Corrupt(err.to_string())
            }
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

/// Row of `exam_drafts`.
#[derive(FromRow)]
struct DraftRow {
    user_id: String,
    exam_id: String,
    answer_data: Json<Vec<AnswerEntry>>,
    saved_at: chrono::DateTime<chrono::Utc>,
}

impl DraftRow {
    fn into_record(self) -> DraftRecord {
        DraftRecord {
            user_id: self.user_id,
            exam_id: self.exam_id,
            answer_data: self.answer_data.0,
            timestamp: self.saved_at,
        }
    }
}

/// Row of `exam_timers`.
#[derive(FromRow)]
struct TimerRow {
    user_id: String,
    exam_id: String,
    hours: i32,
    minutes: i32,
    seconds: i32,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl TimerRow {
    fn into_record(self) -> StoreResult<TimerRecord> {
        let part = |value: i32, name: &str| {
            u32::try_from(value)
                .map_err(|_| StoreError::Corrupt(format!("negative {} in timer row", name)))
        };

        Ok(TimerRecord {
            remaining_time: RemainingTime::new(
                part(self.hours, "hours")?,
                part(self.minutes, "minutes")?,
                part(self.seconds, "seconds")?,
            ),
            user_id: self.user_id,
            exam_id: self.exam_id,
            updated_at: self.updated_at,
        })
    }
}

#[async_trait]
impl DraftStore for PgSessionStore {
    async fn get_draft(&self, key: &SessionKey) -> StoreResult<Option<DraftRecord>> {
        let row = sqlx::query_as::<_, DraftRow>(
            r#"
            SELECT user_id, exam_id, answer_data, saved_at
            FROM exam_drafts
            WHERE user_id = $1 AND exam_id = $2
            "#,
        )
        .bind(&key.user_id)
        .bind(&key.exam_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DraftRow::into_record))
    }

    async fn put_draft(
        &self,
        key: &SessionKey,
        answer_data: Vec<AnswerEntry>,
        timestamp: chrono::DateTime<chrono::Utc>,
    ) -> StoreResult<DraftRecord> {
        // Upsert: the whole answer array replaces the stored one
        let row = sqlx::query_as::<_, DraftRow>(
            r#"
            INSERT INTO exam_drafts (user_id, exam_id, answer_data, saved_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, exam_id) DO UPDATE SET
                answer_data = EXCLUDED.answer_data,
                saved_at = EXCLUDED.saved_at
            RETURNING user_id, exam_id, answer_data, saved_at
            "#,
        )
        .bind(&key.user_id)
        .bind(&key.exam_id)
        .bind(Json(&answer_data))
        .bind(timestamp)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to upsert draft for {}: {:?}", key, e);
            StoreError::from(e)
        })?;

        Ok(row.into_record())
    }
}

#[async_trait]
impl TimerStore for PgSessionStore {
    async fn get_timer(&self, key: &SessionKey) -> StoreResult<Option<TimerRecord>> {
        let row = sqlx::query_as::<_, TimerRow>(
            r#"
            SELECT user_id, exam_id, hours, minutes, seconds, updated_at
            FROM exam_timers
            WHERE user_id = $1 AND exam_id = $2
            "#,
        )
        .bind(&key.user_id)
        .bind(&key.exam_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TimerRow::into_record).transpose()
    }

    async fn put_timer(&self, key: &SessionKey, remaining: RemainingTime) -> StoreResult<TimerRecord> {
        check_remaining(&remaining)?;

        let hours = i32::try_from(remaining.hours)
            .map_err(|_| StoreError::Validation("hours out of range".to_string()))?;

        let row = sqlx::query_as::<_, TimerRow>(
            r#"
            INSERT INTO exam_timers (user_id, exam_id, hours, minutes, seconds, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (user_id, exam_id) DO UPDATE SET
                hours = EXCLUDED.hours,
                minutes = EXCLUDED.minutes,
                seconds = EXCLUDED.seconds,
                updated_at = NOW()
            RETURNING user_id, exam_id, hours, minutes, seconds, updated_at
            "#,
        )
        .bind(&key.user_id)
        .bind(&key.exam_id)
        .bind(hours)
        .bind(remaining.minutes as i32)
        .bind(remaining.seconds as i32)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to upsert timer for {}: {:?}", key, e);
            StoreError::from(e)
        })?;

        row.into_record()
    }
}
