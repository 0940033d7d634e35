use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Attempt {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub assessment_id: Uuid,
    pub status: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub final_score: Option<Decimal>,
    pub result: Option<String>,
    pub is_published: bool,
}

impl Attempt {
    pub fn status(&self) -> Result<AttemptStatus> {
        self.status.parse()
    }

    pub fn result(&self) -> Result<Option<AttemptResult>> {
        self.result.as_deref().map(str::parse).transpose()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptStatus {
    InProgress,
    Submitted,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::InProgress => "IN_PROGRESS",
            AttemptStatus::Submitted => "SUBMITTED",
        }
    }
}

impl FromStr for AttemptStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "IN_PROGRESS" => Ok(AttemptStatus::InProgress),
            "SUBMITTED" => Ok(AttemptStatus::Submitted),
            other => Err(Error::Internal(format!("unknown attempt status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptResult {
    Pass,
    Fail,
}

impl AttemptResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptResult::Pass => "PASS",
            AttemptResult::Fail => "FAIL",
        }
    }
}

impl FromStr for AttemptResult {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PASS" => Ok(AttemptResult::Pass),
            "FAIL" => Ok(AttemptResult::Fail),
            other => Err(Error::Internal(format!("unknown attempt result '{}'", other))),
        }
    }
}

/// Server-side deadline of an attempt: start + duration + grace.
pub fn attempt_deadline(
    start_time: DateTime<Utc>,
    duration_minutes: i32,
    grace_seconds: i64,
) -> DateTime<Utc> {
    start_time + Duration::minutes(duration_minutes as i64) + Duration::seconds(grace_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_round_trip_through_their_stored_text() {
        for s in [AttemptStatus::InProgress, AttemptStatus::Submitted] {
            assert_eq!(s.as_str().parse::<AttemptStatus>().unwrap(), s);
        }
        assert!("DONE".parse::<AttemptStatus>().is_err());
        assert_eq!(
            serde_json::to_value(AttemptResult::Pass).unwrap(),
            serde_json::json!("PASS")
        );
    }

    #[test]
    fn deadline_adds_duration_and_grace() {
        let start = DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let deadline = attempt_deadline(start, 30, 45);
        assert_eq!(deadline.to_rfc3339(), "2026-03-01T10:30:45+00:00");
    }
}
