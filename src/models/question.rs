// src/models/question.rs

use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// The input surface a question needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    SingleSelect,
    MultiSelect,
    FreeText,
    Code,
}

/// A generated question as served by the question service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,

    /// Position in the exam. The question service sends it as a string.
    #[serde(deserialize_with = "number_or_string")]
    pub qno: u32,

    #[serde(default)]
    pub qlabel: String,

    pub qtext: String,

    /// 'MCQ', 'Text' or 'code'.
    pub qtype: String,

    #[serde(default)]
    pub qoptions: Vec<String>,

    /// Languages offered by the code editor.
    #[serde(default)]
    pub qlanguage: Vec<String>,

    #[serde(default)]
    pub difficulty: String,

    /// Distinguishes checkbox MCQs from radio MCQs.
    #[serde(default)]
    pub qmulticheck: bool,
}

impl Question {
    pub fn kind(&self) -> QuestionKind {
        match self.qtype.as_str() {
            "MCQ" | "mcq" if self.qmulticheck => QuestionKind::MultiSelect,
            "MCQ" | "mcq" => QuestionKind::SingleSelect,
            "code" | "Code" => QuestionKind::Code,
            _ => QuestionKind::FreeText,
        }
    }
}

fn number_or_string<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSection {
    pub id: String,
    pub name: String,
    pub marks: i64,
    pub difficulty_level: String,
    pub questions: Vec<Question>,
}

/// Exam metadata browsed by professionals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamDetails {
    #[serde(rename = "exam_id")]
    pub exam_id: String,
    pub total_sections: i64,
    pub difficulty_level: String,
    pub primaryskills: Vec<String>,
    pub secondaryskills: Vec<String>,
    pub total_marks: i64,
    pub sections: Vec<ExamSection>,
}

/// DTO for asking the question service to generate an exam.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = validate_question_counts))]
pub struct GenerateExamRequest {
    #[validate(length(min = 1, message = "At least one topic is required."))]
    pub topic: Vec<String>,
    pub num_mcqs: u32,
    pub num_text: u32,
    pub num_code: u32,
    #[validate(length(min = 1, max = 50))]
    pub difficulty: String,
}

fn validate_question_counts(req: &GenerateExamRequest) -> Result<(), validator::ValidationError> {
    if req.num_mcqs + req.num_text + req.num_code == 0 {
        return Err(validator::ValidationError::new("no_questions_requested"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestExamId {
    pub exam_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadPdfResponse {
    pub message: String,
    pub filename: String,
}

/// Acknowledgement returned by `POST /evaluate_answers`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub status: String,
    pub exam_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionFeedback {
    pub question_id: String,
    pub question: String,
    pub answer: serde_json::Value,
    pub score: i64,
    pub feedback: String,
}

/// Graded result of one candidate, rendered by the results view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamFeedback {
    pub exam_id: String,
    pub user_id: String,
    pub feedback: Vec<QuestionFeedback>,
}
