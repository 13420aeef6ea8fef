// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{draft, exams, timer},
    state::AppState,
};

const MAX_PDF_BYTES: usize = 20 * 1024 * 1024;

/// Assembles the main application router.
///
/// * Session stores: `/api/timer`, `/api/get-draft`, `/api/save-draft`.
/// * Question service proxy for professionals and results: `/api/exams`.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Skipping invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let session_routes = Router::new()
        .route("/timer", get(timer::get_timer).post(timer::save_timer))
        .route("/get-draft", get(draft::get_draft))
        .route("/save-draft", post(draft::save_draft));

    let exam_routes = Router::new()
        .route("/", get(exams::list_exam_ids))
        .route("/latest", get(exams::latest_exam_id))
        .route("/generate", post(exams::generate_exam))
        .route(
            "/upload-pdf",
            post(exams::upload_pdf).layer(DefaultBodyLimit::max(MAX_PDF_BYTES)),
        )
        .route("/{id}", get(exams::get_exam_details))
        .route("/{id}/questions", get(exams::get_exam_questions))
        .route("/{id}/feedback", get(exams::get_feedback));

    Router::new()
        .nest("/api", session_routes)
        .nest("/api/exams", exam_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
