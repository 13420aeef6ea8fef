// src/handlers/exams.rs

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    clients::QuestionServiceClient,
    error::AppError,
    models::question::GenerateExamRequest,
    utils::extract::ValidatedJson,
};

/// Lists every exam id known to the question service.
pub async fn list_exam_ids(
    State(questions): State<QuestionServiceClient>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(questions.exam_ids().await?))
}

/// Returns the most recently generated exam id.
pub async fn latest_exam_id(
    State(questions): State<QuestionServiceClient>,
) -> Result<impl IntoResponse, AppError> {
    let exam_id = questions.latest_exam_id().await?;
    Ok(Json(json!({ "exam_id": exam_id })))
}

/// Returns exam metadata (sections, skills, marks).
pub async fn get_exam_details(
    State(questions): State<QuestionServiceClient>,
    Path(exam_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(questions.exam_details(&exam_id).await?))
}

/// Returns the question set of an exam.
///
/// An unknown exam (upstream 404) and an empty set both mean an invalid exam id.
pub async fn get_exam_questions(
    State(questions): State<QuestionServiceClient>,
    Path(exam_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let list = match questions.questions(&exam_id).await {
        Ok(list) => list,
        Err(e) if e.status() == Some(404) => {
            return Err(AppError::NotFound("Invalid Exam ID".to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    if list.is_empty() {
        return Err(AppError::NotFound("Invalid Exam ID".to_string()));
    }
    Ok(Json(list))
}

/// Generates a new exam from topics.
///
/// The request is validated here so obviously empty requests never reach
/// the question service.
pub async fn generate_exam(
    State(questions): State<QuestionServiceClient>,
    ValidatedJson(req): ValidatedJson<GenerateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(
        "Generating exam on {:?} ({} mcq / {} text / {} code, {})",
        req.topic,
        req.num_mcqs,
        req.num_text,
        req.num_code,
        req.difficulty
    );

    let exam = questions.generate_questions(&req).await?;
    Ok((StatusCode::CREATED, Json(exam)))
}

/// Forwards an uploaded PDF (multipart field `file`) to the question service.
pub async fn upload_pdf(
    State(questions): State<QuestionServiceClient>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload.pdf").to_string();
        if !filename.to_ascii_lowercase().ends_with(".pdf") {
            return Err(AppError::BadRequest("Only PDF files are accepted".to_string()));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        if bytes.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
        }

        let ack = questions.upload_pdf(&filename, bytes.to_vec()).await?;
        return Ok(Json(ack));
    }

    Err(AppError::BadRequest("Missing 'file' field".to_string()))
}

/// Returns graded feedback for an exam, rendered by the results view.
pub async fn get_feedback(
    State(questions): State<QuestionServiceClient>,
    Path(exam_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let feedback = questions
        .feedback(&exam_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No feedback for this exam yet".to_string()))?;

    Ok(Json(feedback))
}
