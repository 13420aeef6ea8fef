//! HTTP clients for the services an exam session talks to.

use std::time::Duration;

use async_trait::async_trait;

use crate::models::question::{EvaluationSummary, Question};

pub mod question_service;
pub mod store_client;

pub use question_service::QuestionServiceClient;
pub use store_client::StoreClient;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} responded with status {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid service URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Upper bound on a whole request, connect through body.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn http_client(timeout: Duration) -> ClientResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|source| ClientError::Request {
            endpoint: "client".to_string(),
            source,
        })
}

/// Where an exam's question set comes from.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn questions(&self, exam_id: &str) -> ClientResult<Vec<Question>>;
}

/// Grades a submitted exam.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(&self, exam_id: &str) -> ClientResult<EvaluationSummary>;
}

/// Joins `path` onto `base`, treating `base` as a directory.
pub(crate) fn join_url(base: &url::Url, path: &str) -> ClientResult<url::Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let dir = format!("{}/", base.path());
        base.set_path(&dir);
    }
    Ok(base.join(path.trim_start_matches('/'))?)
}
