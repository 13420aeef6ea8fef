// src/models/draft.rs

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A candidate's answer to one question.
///
/// Free text, code and single-select answers are plain strings; multi-select
/// answers are a set of the chosen options. Serialized untagged so the wire
/// shape is either `"text"` or `["a", "b"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Text(String),
    Choices(BTreeSet<String>),
}

impl Answer {
    pub fn is_blank(&self) -> bool {
        match self {
            Answer::Text(text) => text.trim().is_empty(),
            Answer::Choices(choices) => choices.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Answer::Text(text) => Some(text),
            Answer::Choices(_) => None,
        }
    }

    pub fn as_choices(&self) -> Option<&BTreeSet<String>> {
        match self {
            Answer::Choices(choices) => Some(choices),
            Answer::Text(_) => None,
        }
    }
}

impl Default for Answer {
    fn default() -> Self {
        Answer::Text(String::new())
    }
}

/// One slot of the answer sheet, indexed by question number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerEntry {
    pub qno: u32,
    pub qid: String,
    #[serde(default)]
    pub review: bool,
    #[serde(default)]
    pub answer: Answer,
}

/// Represents a row of the `exam_drafts` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRecord {
    pub user_id: String,
    pub exam_id: String,
    pub answer_data: Vec<AnswerEntry>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// DTO for `POST /api/save-draft`.
///
/// The whole answer array is sent on every save; the stored draft is
/// replaced, never merged.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveDraftRequest {
    #[validate(length(min = 1, max = 255, message = "userId must not be empty."))]
    pub user_id: String,
    #[validate(length(min = 1, max = 255, message = "examId must not be empty."))]
    pub exam_id: String,
    pub user_answer_data: Vec<AnswerEntry>,
    /// Client-side save time. Defaults to the server clock when absent.
    #[serde(default)]
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveDraftResponse {
    pub message: String,
    pub draft: DraftRecord,
}
