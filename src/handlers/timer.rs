// src/handlers/timer.rs

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::{
        session::{SessionKey, SessionKeyParams},
        timer::{SaveTimerRequest, TimerResponse},
    },
    state::SharedStore,
    utils::extract::ValidatedJson,
};

/// Fetches the stored countdown for a (userId, examId) pair.
///
/// An unknown pair is not an error: the response carries `success: false`
/// and `data: null`, and the caller starts a fresh countdown.
pub async fn get_timer(
    State(store): State<SharedStore>,
    Query(params): Query<SessionKeyParams>,
) -> Result<impl IntoResponse, AppError> {
    let key = params.into_key()?;

    let response = match store.get_timer(&key).await? {
        Some(record) => TimerResponse {
            success: true,
            message: None,
            data: Some(record),
        },
        None => TimerResponse {
            success: false,
            message: Some("Timer not found".to_string()),
            data: None,
        },
    };

    Ok(Json(response))
}

/// Upserts the countdown for a (userId, examId) pair.
pub async fn save_timer(
    State(store): State<SharedStore>,
    ValidatedJson(req): ValidatedJson<SaveTimerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let key = SessionKey::new(req.user_id, req.exam_id)?;

    let record = store.put_timer(&key, req.remaining_time).await?;
    tracing::debug!("Timer for {} saved at {}", key, record.remaining_time);

    Ok(Json(TimerResponse {
        success: true,
        message: None,
        data: Some(record),
    }))
}
