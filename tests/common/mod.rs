// tests/common/mod.rs

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use exam_session::{
    clients::QuestionServiceClient,
    config::{Config, SessionConfig},
    routes,
    state::AppState,
    store::MemorySessionStore,
};
use serde_json::{Value, json};

pub struct TestApp {
    pub address: String,
    pub store: Arc<MemorySessionStore>,
    pub question_service: String,
}

/// Spawns the app on a random port, backed by an in-memory store and a stub
/// question service.
pub async fn spawn_app() -> TestApp {
    let question_service = spawn_question_service().await;
    let store = Arc::new(MemorySessionStore::new());

    let config = Config {
        database_url: "postgres://unused".to_string(),
        question_service_url: question_service.clone(),
        bind_address: "127.0.0.1:0".parse().unwrap(),
        cors_origins: vec!["http://localhost:3000".to_string()],
        rust_log: "error".to_string(),
        session: SessionConfig::default(),
        warnings: Vec::new(),
    };

    let state = AppState {
        store: store.clone(),
        questions: QuestionServiceClient::new(&question_service).unwrap(),
        config,
    };

    let address = serve(routes::create_router(state)).await;
    TestApp {
        address,
        store,
        question_service,
    }
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

/// Question set served for `exam-1`.
pub fn sample_questions() -> Value {
    json!([
        { "id": "q2", "qno": "1", "qtext": "Pick the borrow checker rules", "qtype": "MCQ",
          "qoptions": ["aliasing xor mutation", "garbage collection", "lifetimes"],
          "qmulticheck": true, "difficulty": "medium" },
        { "id": "q1", "qno": "0", "qtext": "What is 6 * 7?", "qtype": "Text",
          "difficulty": "easy" },
        { "id": "q3", "qno": "2", "qtext": "Which keyword moves a closure's captures?",
          "qtype": "MCQ", "qoptions": ["move", "ref"], "difficulty": "easy" },
        { "id": "q4", "qno": "3", "qtext": "Reverse a string", "qtype": "code",
          "qlanguage": ["rust", "python"], "difficulty": "hard" }
    ])
}

fn exam_details(exam_id: &str) -> Value {
    json!({
        "exam_id": exam_id,
        "totalSections": 1,
        "difficultyLevel": "medium",
        "primaryskills": ["rust"],
        "secondaryskills": ["tokio"],
        "totalMarks": 40,
        "sections": [{
            "id": "s1",
            "name": "Basics",
            "marks": 40,
            "difficultyLevel": "medium",
            "questions": sample_questions()
        }]
    })
}

async fn spawn_question_service() -> String {
    async fn questions(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
        match params.get("exam_id").map(String::as_str) {
            Some("exam-1") => (StatusCode::OK, Json(sample_questions())),
            Some("exam-empty") => (StatusCode::OK, Json(json!([]))),
            _ => (StatusCode::NOT_FOUND, Json(json!({ "detail": "Exam not found" }))),
        }
    }

    async fn details(Path(exam_id): Path<String>) -> impl IntoResponse {
        match exam_id.as_str() {
            "exam-1" => (StatusCode::OK, Json(exam_details("exam-1"))),
            "slow" => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                (StatusCode::OK, Json(exam_details("slow")))
            }
            "broken" => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": "boom" })),
            ),
            _ => (StatusCode::NOT_FOUND, Json(json!({ "detail": "Exam not found" }))),
        }
    }

    async fn generate(Json(body): Json<Value>) -> Json<Value> {
        let mut exam = exam_details("exam-2");
        exam["primaryskills"] = body["topic"].clone();
        Json(exam)
    }

    async fn upload(mut multipart: Multipart) -> impl IntoResponse {
        while let Some(field) = multipart.next_field().await.unwrap() {
            if field.name() == Some("file") {
                let filename = field.file_name().unwrap_or_default().to_string();
                return (
                    StatusCode::OK,
                    Json(json!({ "message": "PDF received", "filename": filename })),
                );
            }
        }
        (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "detail": "no file" })))
    }

    async fn evaluate(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        Json(json!({
            "status": "evaluated",
            "exam_id": params.get("exam_id").cloned().unwrap_or_default()
        }))
    }

    async fn feedback(Path(exam_id): Path<String>) -> impl IntoResponse {
        if exam_id != "exam-1" {
            return (StatusCode::NOT_FOUND, Json(json!({ "detail": "No feedback" })));
        }
        (
            StatusCode::OK,
            Json(json!([{
                "examId": "exam-1",
                "userId": "alice",
                "feedback": [{
                    "question_id": "q1",
                    "question": "What is 6 * 7?",
                    "answer": "42",
                    "score": 10,
                    "feedback": "Correct."
                }]
            }])),
        )
    }

    let app = Router::new()
        .route("/questions", get(questions))
        .route("/exam_ids", get(|| async { Json(json!(["exam-1", "exam-2"])) }))
        .route(
            "/latest_exam_id",
            get(|| async { Json(json!({ "exam_id": "exam-2" })) }),
        )
        .route("/exam_details/{id}", get(details))
        .route("/generate-questions", post(generate))
        .route("/upload-pdf/", post(upload))
        .route("/evaluate_answers", post(evaluate))
        .route("/feedback/{id}", get(feedback));

    serve(app).await
}
