// src/models/timer.rs

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Remaining exam time as an HH:MM:SS triple.
///
/// Minutes and seconds stay within `0..=59`; the countdown borrows
/// seconds -> minutes -> hours and stops at 00:00:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemainingTime {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl RemainingTime {
    pub const ZERO: RemainingTime = RemainingTime::new(0, 0, 0);

    pub const fn new(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self {
            hours,
            minutes,
            seconds,
        }
    }

    /// Normalizes a duration into a triple, dropping sub-second precision.
    pub fn from_duration(duration: Duration) -> Self {
        let total = duration.as_secs();
        let hours = u32::try_from(total / 3600).unwrap_or(u32::MAX);
        Self::new(hours, ((total % 3600) / 60) as u32, (total % 60) as u32)
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.total_seconds())
    }

    pub fn total_seconds(&self) -> u64 {
        u64::from(self.hours) * 3600 + u64::from(self.minutes) * 60 + u64::from(self.seconds)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    pub fn is_valid(&self) -> bool {
        self.minutes < 60 && self.seconds < 60
    }

    /// Advances the countdown by one second. Saturates at zero.
    pub fn tick(&self) -> Self {
        let Self {
            hours,
            minutes,
            seconds,
        } = *self;

        if seconds > 0 {
            Self::new(hours, minutes, seconds - 1)
        } else if minutes > 0 {
            Self::new(hours, minutes - 1, 59)
        } else if hours > 0 {
            Self::new(hours - 1, 59, 59)
        } else {
            Self::ZERO
        }
    }
}

impl Default for RemainingTime {
    /// Two hours, the duration of a fresh exam.
    fn default() -> Self {
        Self::new(2, 0, 0)
    }
}

impl fmt::Display for RemainingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

pub(crate) fn validate_remaining_time(time: &RemainingTime) -> Result<(), ValidationError> {
    if !time.is_valid() {
        return Err(ValidationError::new("remaining_time_out_of_range"));
    }
    Ok(())
}

/// The stored timer for one (userId, examId) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerRecord {
    pub user_id: String,
    pub exam_id: String,
    pub remaining_time: RemainingTime,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for `POST /api/timer`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveTimerRequest {
    #[validate(length(min = 1, max = 255, message = "userId must not be empty."))]
    pub user_id: String,
    #[validate(length(min = 1, max = 255, message = "examId must not be empty."))]
    pub exam_id: String,
    #[validate(custom(function = validate_remaining_time))]
    pub remaining_time: RemainingTime,
}

/// Envelope returned by the timer endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct TimerResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Option<TimerRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_decrements_seconds() {
        assert_eq!(RemainingTime::new(1, 2, 3).tick(), RemainingTime::new(1, 2, 2));
    }

    #[test]
    fn tick_borrows_from_minutes_and_hours() {
        assert_eq!(RemainingTime::new(0, 1, 0).tick(), RemainingTime::new(0, 0, 59));
        assert_eq!(RemainingTime::new(2, 0, 0).tick(), RemainingTime::new(1, 59, 59));
    }

    #[test]
    fn tick_stops_at_zero() {
        assert_eq!(RemainingTime::new(0, 0, 1).tick(), RemainingTime::ZERO);
        assert_eq!(RemainingTime::ZERO.tick(), RemainingTime::ZERO);
    }

    #[test]
    fn full_countdown_stays_valid() {
        let mut time = RemainingTime::new(0, 3, 5);
        let mut steps = 0;
        while !time.is_zero() {
            time = time.tick();
            assert!(time.is_valid());
            steps += 1;
        }
        assert_eq!(steps, 185);
    }

    #[test]
    fn duration_conversion() {
        let time = RemainingTime::from_duration(Duration::from_secs(7325));
        assert_eq!(time, RemainingTime::new(2, 2, 5));
        assert_eq!(time.as_duration(), Duration::from_secs(7325));
        assert_eq!(time.to_string(), "02:02:05");
    }

    #[test]
    fn out_of_range_minutes_fail_validation() {
        let req = SaveTimerRequest {
            user_id: "alice".to_string(),
            exam_id: "exam-1".to_string(),
            remaining_time: RemainingTime::new(0, 75, 0),
        };
        assert!(req.validate().is_err());
    }
}
