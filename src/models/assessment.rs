use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Assessment {
    pub id: Uuid,
    pub title: String,
    pub duration_minutes: i32,
    pub pass_percentage: Decimal,
    /// Sum of the current questions' marks; maintained by the question service only.
    pub total_marks: Decimal,
    pub status: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
}

impl Assessment {
    pub fn status(&self) -> Result<AssessmentStatus> {
        self.status.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssessmentStatus {
    Active,
    Inactive,
}

impl AssessmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentStatus::Active => "ACTIVE",
            AssessmentStatus::Inactive => "INACTIVE",
        }
    }
}

impl FromStr for AssessmentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ACTIVE" => Ok(AssessmentStatus::Active),
            "INACTIVE" => Ok(AssessmentStatus::Inactive),
            other => Err(Error::Internal(format!("unknown assessment status '{}'", other))),
        }
    }
}
