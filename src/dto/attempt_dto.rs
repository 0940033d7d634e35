use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::attempt::{AttemptResult, AttemptStatus};
use crate::models::question::PublicQuestion;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartAttemptRequest {
    #[validate(length(min = 1, max = 32, message = "Assessment code is required"))]
    pub assessment_code: String,
    pub assessment_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartAttemptResponse {
    pub attempt_id: Uuid,
    pub duration_minutes: i32,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttemptQuestionsResponse {
    pub attempt_id: Uuid,
    pub status: AttemptStatus,
    pub duration_minutes: i32,
    pub start_time: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveAnswerRequest {
    pub question_id: Uuid,
    #[validate(length(max = 20000, message = "Answer is too long"))]
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveAnswerResponse {
    pub answer_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttemptResponse {
    pub score: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GradeAnswerRequest {
    pub answer_id: Uuid,
    pub marks: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GradeAnswerResponse {
    pub attempt_id: Uuid,
    pub finalized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AttemptResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_score: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublishResponse {
    pub published: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublishAllResponse {
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogViolationRequest {
    pub attempt_id: Uuid,
    #[validate(length(min = 1, max = 64, message = "Violation type is required"))]
    pub violation_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogViolationResponse {
    pub violation_id: Uuid,
}

/// Published result as the candidate sees it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CandidateResult {
    pub attempt_id: Uuid,
    pub assessment_id: Uuid,
    pub assessment_title: String,
    pub final_score: Option<Decimal>,
    pub total_marks: Decimal,
    pub result: Option<String>,
    pub end_time: Option<DateTime<Utc>>,
}
