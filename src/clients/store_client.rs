// src/clients/store_client.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use url::Url;

use super::{ClientError, REQUEST_TIMEOUT, http_client, join_url};
use crate::{
    models::{
        draft::{AnswerEntry, DraftRecord, SaveDraftRequest, SaveDraftResponse},
        session::SessionKey,
        timer::{RemainingTime, SaveTimerRequest, TimerRecord, TimerResponse},
    },
    store::{DraftStore, StoreError, StoreResult, TimerStore},
};

/// Draft and timer stores reached over the `/api` endpoints of this service.
#[derive(Debug, Clone)]
pub struct StoreClient {
    base_url: Url,
    http: reqwest::Client,
}

impl StoreClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, REQUEST_TIMEOUT)
    }

    /// A slow store surfaces as [`StoreError::Unavailable`] once `timeout` passes.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            http: http_client(timeout)?,
        })
    }

    fn url(&self, path: &str) -> StoreResult<Url> {
        join_url(&self.base_url, path).map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

fn unavailable(endpoint: &str, err: reqwest::Error) -> StoreError {
    StoreError::Unavailable(format!("{}: {}", endpoint, err))
}

/// Maps a non-2xx store response onto the store taxonomy.
async fn reject(endpoint: &str, resp: reqwest::Response) -> StoreError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    if status == StatusCode::BAD_REQUEST {
        StoreError::Validation(body)
    } else {
        StoreError::Unavailable(format!("{} responded with {}: {}", endpoint, status, body))
    }
}

#[async_trait]
impl DraftStore for StoreClient {
    async fn get_draft(&self, key: &SessionKey) -> StoreResult<Option<DraftRecord>> {
        let resp = self
            .http
            .get(self.url("api/get-draft")?)
            .query(&[("userId", &key.user_id), ("examId", &key.exam_id)])
            .send()
            .await
            .map_err(|e| unavailable("get-draft", e))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => resp
                .json::<DraftRecord>()
                .await
                .map(Some)
                .map_err(|e| StoreError::Corrupt(e.to_string())),
            _ => Err(reject("get-draft", resp).await),
        }
    }

    async fn put_draft(
        &self,
        key: &SessionKey,
        answer_data: Vec<AnswerEntry>,
        timestamp: chrono::DateTime<chrono::Utc>,
    ) -> StoreResult<DraftRecord> {
        let body = SaveDraftRequest {
            user_id: key.user_id.clone(),
            exam_id: key.exam_id.clone(),
            user_answer_data: answer_data,
            timestamp: Some(timestamp),
        };

        let resp = self
            .http
            .post(self.url("api/save-draft")?)
            .json(&body)
            .send()
            .await
            .map_err(|e| unavailable("save-draft", e))?;

        if !resp.status().is_success() {
            return Err(reject("save-draft", resp).await);
        }

        let saved: SaveDraftResponse = resp
            .json()
            .await
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(saved.draft)
    }
}

#[async_trait]
impl TimerStore for StoreClient {
    async fn get_timer(&self, key: &SessionKey) -> StoreResult<Option<TimerRecord>> {
        let resp = self
            .http
            .get(self.url("api/timer")?)
            .query(&[("userId", &key.user_id), ("examId", &key.exam_id)])
            .send()
            .await
            .map_err(|e| unavailable("timer", e))?;

        if !resp.status().is_success() {
            return Err(reject("timer", resp).await);
        }

        let envelope: TimerResponse = resp
            .json()
            .await
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(envelope.data)
    }

    async fn put_timer(&self, key: &SessionKey, remaining: RemainingTime) -> StoreResult<TimerRecord> {
        let body = SaveTimerRequest {
            user_id: key.user_id.clone(),
            exam_id: key.exam_id.clone(),
            remaining_time: remaining,
        };

        let resp = self
            .http
            .post(self.url("api/timer")?)
            .json(&body)
            .send()
            .await
            .map_err(|e| unavailable("timer", e))?;

        if !resp.status().is_success() {
            return Err(reject("timer", resp).await);
        }

        let envelope: TimerResponse = resp
            .json()
            .await
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        envelope
            .data
            .ok_or_else(|| StoreError::Corrupt("timer save returned no record".to_string()))
    }
}
