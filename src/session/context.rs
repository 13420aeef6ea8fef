use chrono::{DateTime, Utc};

use crate::models::session::SessionKey;
use crate::store::StoreError;
use crate::utils::jwt::read_claims;

/// Identity used when no usable token is present.
pub const GUEST_USER: &str = "guest";

#[derive(Debug, Clone)]
struct Identity {
    token: String,
    user_id: String,
    expires_at: Option<DateTime<Utc>>,
}

/// Who is taking which exam.
///
/// Holds the identity token and the active exam id that a session needs.
/// A missing, malformed or expired token reads as the guest identity.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    identity: Option<Identity>,
    exam_id: Option<String>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.set_token(token);
        self
    }

    pub fn with_exam_id(mut self, exam_id: impl Into<String>) -> Self {
        self.set_exam_id(exam_id);
        self
    }

    /// Stores a token. Unreadable tokens are dropped with a warning.
    pub fn set_token(&mut self, token: &str) {
        self.identity = match read_claims(token) {
            Ok(claims) => match claims.user_id() {
                Some(user_id) => Some(Identity {
                    token: token.to_string(),
                    user_id,
                    expires_at: claims.expires_at(),
                }),
                None => {
                    tracing::warn!("Identity token has no subject or email; using guest");
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Invalid identity token ({}); using guest", e);
                None
            }
        };
    }

    pub fn clear_token(&mut self) {
        self.identity = None;
    }

    /// The raw token, if present and not expired at `now`.
    pub fn token_at(&self, now: DateTime<Utc>) -> Option<&str> {
        self.live_identity(now).map(|id| id.token.as_str())
    }

    pub fn token(&self) -> Option<&str> {
        self.token_at(Utc::now())
    }

    pub fn user_id_at(&self, now: DateTime<Utc>) -> &str {
        self.live_identity(now)
            .map(|id| id.user_id.as_str())
            .unwrap_or(GUEST_USER)
    }

    pub fn user_id(&self) -> &str {
        self.user_id_at(Utc::now())
    }

    pub fn is_guest(&self) -> bool {
        self.user_id() == GUEST_USER
    }

    pub fn exam_id(&self) -> Option<&str> {
        self.exam_id.as_deref()
    }

    /// Selects the active exam, replacing any previous selection.
    pub fn set_exam_id(&mut self, exam_id: impl Into<String>) {
        let exam_id = exam_id.into();
        self.exam_id = (!exam_id.trim().is_empty()).then_some(exam_id);
    }

    pub fn clear_exam_id(&mut self) {
        self.exam_id = None;
    }

    pub fn session_key(&self) -> Result<SessionKey, StoreError> {
        let exam_id = self
            .exam_id()
            .ok_or_else(|| StoreError::Validation("no exam selected".to_string()))?;
        SessionKey::new(self.user_id(), exam_id)
    }

    fn live_identity(&self, now: DateTime<Utc>) -> Option<&Identity> {
        let identity = self.identity.as_ref()?;
        match identity.expires_at {
            Some(expires_at) if expires_at <= now => None,
            _ => Some(identity),
        }
    }
}
