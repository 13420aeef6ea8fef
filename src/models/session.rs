// src/models/session.rs

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// The (userId, examId) pair identifying one exam attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionKey {
    pub user_id: String,
    pub exam_id: String,
}

impl SessionKey {
    /// Builds a key, rejecting blank components.
    pub fn new(user_id: impl Into<String>, exam_id: impl Into<String>) -> Result<Self, StoreError> {
        let user_id = user_id.into();
        let exam_id = exam_id.into();

        if user_id.trim().is_empty() {
            return Err(StoreError::Validation("userId is required".to_string()));
        }
        if exam_id.trim().is_empty() {
            return Err(StoreError::Validation("examId is required".to_string()));
        }

        Ok(Self { user_id, exam_id })
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.exam_id)
    }
}

/// Query parameters shared by the `GET` store endpoints.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionKeyParams {
    pub user_id: Option<String>,
    pub exam_id: Option<String>,
}

impl SessionKeyParams {
    pub fn into_key(self) -> Result<SessionKey, StoreError> {
        match (self.user_id, self.exam_id) {
            (Some(user_id), Some(exam_id)) => SessionKey::new(user_id, exam_id),
            _ => Err(StoreError::Validation("Missing userId or examId".to_string())),
        }
    }
}
