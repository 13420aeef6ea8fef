// src/clients/question_service.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, multipart};
use serde::de::DeserializeOwned;
use url::Url;

use super::{
    ClientError, ClientResult, Evaluator, QuestionSource, REQUEST_TIMEOUT, http_client, join_url,
};
use crate::models::question::{
    EvaluationSummary, ExamDetails, ExamFeedback, GenerateExamRequest, LatestExamId, Question,
    UploadPdfResponse,
};

/// Client for the external question generation and grading service.
#[derive(Debug, Clone)]
pub struct QuestionServiceClient {
    base_url: Url,
    http: reqwest::Client,
}

impl QuestionServiceClient {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        Self::with_timeout(base_url, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            http: http_client(timeout)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET /questions?exam_id=`
    pub async fn questions(&self, exam_id: &str) -> ClientResult<Vec<Question>> {
        let url = join_url(&self.base_url, "questions")?;
        let resp = self.http.get(url).query(&[("exam_id", exam_id)]).send();
        decode("questions", resp.await).await
    }

    /// `GET /exam_details/{id}`
    pub async fn exam_details(&self, exam_id: &str) -> ClientResult<ExamDetails> {
        let url = join_url(&self.base_url, &format!("exam_details/{}", exam_id))?;
        decode("exam_details", self.http.get(url).send().await).await
    }

    /// `GET /exam_ids`
    pub async fn exam_ids(&self) -> ClientResult<Vec<String>> {
        let url = join_url(&self.base_url, "exam_ids")?;
        decode("exam_ids", self.http.get(url).send().await).await
    }

    /// `GET /latest_exam_id`
    pub async fn latest_exam_id(&self) -> ClientResult<String> {
        let url = join_url(&self.base_url, "latest_exam_id")?;
        let latest: LatestExamId = decode("latest_exam_id", self.http.get(url).send().await).await?;
        Ok(latest.exam_id)
    }

    /// `POST /generate-questions`
    pub async fn generate_questions(&self, req: &GenerateExamRequest) -> ClientResult<ExamDetails> {
        let url = join_url(&self.base_url, "generate-questions")?;
        decode("generate-questions", self.http.post(url).json(req).send().await).await
    }

    /// `POST /upload-pdf/` as a multipart form with a single `file` part.
    pub async fn upload_pdf(&self, filename: &str, bytes: Vec<u8>) -> ClientResult<UploadPdfResponse> {
        let url = join_url(&self.base_url, "upload-pdf/")?;
        let part = multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("application/pdf")
            .map_err(|source| ClientError::Request {
                endpoint: "upload-pdf".to_string(),
                source,
            })?;
        let form = multipart::Form::new().part("file", part);

        decode("upload-pdf", self.http.post(url).multipart(form).send().await).await
    }

    /// `POST /evaluate_answers?exam_id=`
    pub async fn evaluate_answers(&self, exam_id: &str) -> ClientResult<EvaluationSummary> {
        let url = join_url(&self.base_url, "evaluate_answers")?;
        let resp = self.http.post(url).query(&[("exam_id", exam_id)]).send();
        decode("evaluate_answers", resp.await).await
    }

    /// `GET /feedback/{exam_id}`. A 404 means nothing has been graded yet.
    pub async fn feedback(&self, exam_id: &str) -> ClientResult<Option<Vec<ExamFeedback>>> {
        let url = join_url(&self.base_url, &format!("feedback/{}", exam_id))?;
        match decode("feedback", self.http.get(url).send().await).await {
            Ok(feedback) => Ok(Some(feedback)),
            Err(ClientError::Status { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

pub(super) async fn decode<T: DeserializeOwned>(
    endpoint: &str,
    resp: Result<Response, reqwest::Error>,
) -> ClientResult<T> {
    let resp = resp.map_err(|source| ClientError::Request {
        endpoint: endpoint.to_string(),
        source,
    })?;

    let status = resp.status();
    if !status.is_success() {
        tracing::warn!("Question service {} returned {}", endpoint, status);
        return Err(ClientError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        });
    }

    resp.json::<T>().await.map_err(|source| ClientError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

#[async_trait]
impl QuestionSource for QuestionServiceClient {
    async fn questions(&self, exam_id: &str) -> ClientResult<Vec<Question>> {
        QuestionServiceClient::questions(self, exam_id).await
    }
}

#[async_trait]
impl Evaluator for QuestionServiceClient {
    async fn evaluate(&self, exam_id: &str) -> ClientResult<EvaluationSummary> {
        self.evaluate_answers(exam_id).await
    }
}
