// src/handlers/draft.rs

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    error::AppError,
    models::{
        draft::{SaveDraftRequest, SaveDraftResponse},
        session::{SessionKey, SessionKeyParams},
    },
    state::SharedStore,
    utils::extract::ValidatedJson,
};

/// Returns the saved draft for a (userId, examId) pair, or 404.
pub async fn get_draft(
    State(store): State<SharedStore>,
    Query(params): Query<SessionKeyParams>,
) -> Result<Response, AppError> {
    let key = params.into_key()?;

    match store.get_draft(&key).await? {
        Some(draft) => Ok(Json(draft).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "No draft found" })),
        )
            .into_response()),
    }
}

/// Saves the candidate's whole answer array.
///
/// * Creates the draft on first save.
/// * Replaces `answerData` wholesale on later saves (no merge).
pub async fn save_draft(
    State(store): State<SharedStore>,
    ValidatedJson(req): ValidatedJson<SaveDraftRequest>,
) -> Result<impl IntoResponse, AppError> {
    let key = SessionKey::new(req.user_id, req.exam_id)?;
    let timestamp = req.timestamp.unwrap_or_else(chrono::Utc::now);

    let draft = store
        .put_draft(&key, req.user_answer_data, timestamp)
        .await?;
    tracing::debug!("Draft for {} saved ({} answers)", key, draft.answer_data.len());

    Ok(Json(SaveDraftResponse {
        message: "Draft saved successfully".to_string(),
        draft,
    }))
}
