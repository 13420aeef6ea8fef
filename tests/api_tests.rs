// tests/api_tests.rs

mod common;

use common::spawn_app;
use serde_json::{Value, json};

fn unique_user() -> String {
    format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8])
}

#[tokio::test]
async fn health_check_404() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/random_path_that_does_not_exist", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn timer_not_found_is_not_an_error() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/api/timer", app.address))
        .query(&[("userId", unique_user().as_str()), ("examId", "exam-1")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Timer not found");
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn timer_upsert_and_fetch() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let user = unique_user();

    for remaining in [
        json!({ "hours": 1, "minutes": 59, "seconds": 30 }),
        json!({ "hours": 1, "minutes": 45, "seconds": 0 }),
    ] {
        let response = client
            .post(&format!("{}/api/timer", app.address))
            .json(&json!({ "userId": user, "examId": "exam-1", "remainingTime": remaining }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["remainingTime"], remaining);
    }

    let body: Value = client
        .get(&format!("{}/api/timer", app.address))
        .query(&[("userId", user.as_str()), ("examId", "exam-1")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["userId"], user);
    assert_eq!(
        body["data"]["remainingTime"],
        json!({ "hours": 1, "minutes": 45, "seconds": 0 })
    );
}

#[tokio::test]
async fn timer_rejects_bad_input() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Missing examId
    let response = client
        .get(&format!("{}/api/timer", app.address))
        .query(&[("userId", "alice")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Missing userId or examId");

    // Missing remainingTime
    let response = client
        .post(&format!("{}/api/timer", app.address))
        .json(&json!({ "userId": "alice", "examId": "exam-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // Minutes out of range
    let response = client
        .post(&format!("{}/api/timer", app.address))
        .json(&json!({
            "userId": "alice",
            "examId": "exam-1",
            "remainingTime": { "hours": 0, "minutes": 75, "seconds": 0 }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn draft_missing_returns_404() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/api/get-draft", app.address))
        .query(&[("userId", unique_user().as_str()), ("examId", "exam-1")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "No draft found");
}

#[tokio::test]
async fn draft_round_trip_keeps_answers_verbatim() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let user = unique_user();
    let answers = json!([{ "qno": 0, "qid": "q1", "review": false, "answer": "42" }]);

    let response = client
        .post(&format!("{}/api/save-draft", app.address))
        .json(&json!({ "userId": user, "examId": "exam-1", "userAnswerData": answers }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Draft saved successfully");
    assert_eq!(body["draft"]["answerData"], answers);

    let draft: Value = client
        .get(&format!("{}/api/get-draft", app.address))
        .query(&[("userId", user.as_str()), ("examId", "exam-1")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(draft["userId"], user);
    assert_eq!(draft["examId"], "exam-1");
    assert_eq!(draft["answerData"], answers);
    assert!(draft["timestamp"].is_string());
}

#[tokio::test]
async fn draft_save_replaces_previous_answers() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let user = unique_user();

    let first = json!([
        { "qno": 0, "qid": "q1", "review": true, "answer": "41" },
        { "qno": 1, "qid": "q2", "review": false, "answer": ["lifetimes"] }
    ]);
    let second = json!([{ "qno": 0, "qid": "q1", "review": false, "answer": "42" }]);

    for answers in [&first, &second] {
        let response = client
            .post(&format!("{}/api/save-draft", app.address))
            .json(&json!({ "userId": user, "examId": "exam-1", "userAnswerData": answers }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    let draft: Value = client
        .get(&format!("{}/api/get-draft", app.address))
        .query(&[("userId", user.as_str()), ("examId", "exam-1")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(draft["answerData"], second);
}

#[tokio::test]
async fn draft_save_requires_keys() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/api/save-draft", app.address))
        .json(&json!({ "userId": "", "examId": "exam-1", "userAnswerData": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = client
        .post(&format!("{}/api/save-draft", app.address))
        .json(&json!({ "userId": "alice", "examId": "exam-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn exams_proxy_the_question_service() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let ids: Vec<String> = client
        .get(&format!("{}/api/exams", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ids, vec!["exam-1", "exam-2"]);

    let latest: Value = client
        .get(&format!("{}/api/exams/latest", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(latest["exam_id"], "exam-2");

    let details: Value = client
        .get(&format!("{}/api/exams/exam-1", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(details["exam_id"], "exam-1");
    assert_eq!(details["totalMarks"], 40);

    let response = client
        .get(&format!("{}/api/exams/exam-1/questions", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let questions: Vec<Value> = response.json().await.unwrap();
    assert_eq!(questions.len(), 4);
    assert!(questions.iter().any(|q| q["qno"] == 0 && q["id"] == "q1"));
}

#[tokio::test]
async fn unknown_exam_questions_are_404() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/api/exams/nope/questions", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid Exam ID");

    // The question service knows the exam but it has no questions
    let response = client
        .get(&format!("{}/api/exams/exam-empty/questions", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid Exam ID");

    let response = client
        .get(&format!("{}/api/exams/nope", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn upstream_failure_is_bad_gateway() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/api/exams/broken", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 502);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "The question service is unavailable. Please try again."
    );
}

#[tokio::test]
async fn generate_exam_validates_then_forwards() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/api/exams/generate", app.address))
        .json(&json!({
            "topic": [], "num_mcqs": 5, "num_text": 0, "num_code": 0, "difficulty": "easy"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = client
        .post(&format!("{}/api/exams/generate", app.address))
        .json(&json!({
            "topic": ["ownership"], "num_mcqs": 0, "num_text": 0, "num_code": 0,
            "difficulty": "easy"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = client
        .post(&format!("{}/api/exams/generate", app.address))
        .json(&json!({
            "topic": ["ownership"], "num_mcqs": 3, "num_text": 1, "num_code": 1,
            "difficulty": "medium"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let exam: Value = response.json().await.unwrap();
    assert_eq!(exam["exam_id"], "exam-2");
    assert_eq!(exam["primaryskills"], json!(["ownership"]));
}

#[tokio::test]
async fn upload_pdf_is_forwarded() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let part = reqwest::multipart::Part::bytes(b"%PDF-1.4 test".to_vec()).file_name("syllabus.pdf");
    let response = client
        .post(&format!("{}/api/exams/upload-pdf", app.address))
        .multipart(reqwest::multipart::Form::new().part("file", part))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["filename"], "syllabus.pdf");

    let part = reqwest::multipart::Part::bytes(b"hello".to_vec()).file_name("notes.txt");
    let response = client
        .post(&format!("{}/api/exams/upload-pdf", app.address))
        .multipart(reqwest::multipart::Form::new().part("file", part))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn feedback_is_served_once_graded() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/api/exams/exam-1/feedback", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body[0]["userId"], "alice");
    assert_eq!(body[0]["feedback"][0]["score"], 10);

    let response = client
        .get(&format!("{}/api/exams/exam-2/feedback", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}
