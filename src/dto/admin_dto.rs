use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::assessment::AssessmentStatus;
use crate::models::attempt::Attempt;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateAssessmentRequest {
    #[validate(length(min = 1, max = 255, message = "Title cannot be empty"))]
    pub title: String,
    #[validate(range(min = 1, max = 1440, message = "Duration must be between 1 and 1440 minutes"))]
    pub duration_minutes: i32,
    pub pass_percentage: Option<Decimal>,
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateAssessmentResponse {
    pub assessment_id: Uuid,
    pub code: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateAssessmentRequest {
    #[validate(length(min = 1, max = 255, message = "Title cannot be empty"))]
    pub title: Option<String>,
    #[validate(range(min = 1, max = 1440, message = "Duration must be between 1 and 1440 minutes"))]
    pub duration_minutes: Option<i32>,
    pub pass_percentage: Option<Decimal>,
    pub status: Option<AssessmentStatus>,
}

/// Question as submitted by an administrator. MCQ options are display texts;
/// `correct_answer` names one of them by its text.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuestionPayload {
    pub question_text: String,
    pub question_type: String,
    pub marks: Decimal,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub correct_answer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkQuestionsRequest {
    pub questions: Vec<QuestionPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddQuestionResponse {
    pub question_id: Uuid,
    pub total_marks: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkQuestionsResponse {
    pub inserted_count: usize,
    pub total_marks: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteQuestionResponse {
    pub deleted: bool,
    pub total_marks: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CandidatePayload {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkCandidatesRequest {
    pub candidates: Vec<CandidatePayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddCandidateResponse {
    pub candidate_id: Uuid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct BulkCandidatesResponse {
    pub inserted_count: u64,
    pub skipped_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttemptListItem {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub candidate_email: String,
    pub candidate_name: String,
    pub status: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub final_score: Option<Decimal>,
    pub result: Option<String>,
    pub is_published: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttemptSummary {
    pub id: Uuid,
    pub assessment_id: Uuid,
    pub assessment_title: String,
    pub candidate_id: Uuid,
    pub candidate_email: String,
    pub candidate_name: String,
    pub status: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub final_score: Option<Decimal>,
    pub result: Option<String>,
    pub is_published: bool,
    pub violation_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AnswerDetail {
    pub answer_id: Uuid,
    pub question_id: Uuid,
    pub question_text: String,
    pub question_type: String,
    pub correct_answer: Option<String>,
    pub answer: String,
    pub marks_obtained: Option<Decimal>,
    pub max_marks: Decimal,
    pub is_graded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttemptDetails {
    pub attempt: Attempt,
    pub assessment_title: String,
    pub total_marks: Decimal,
    pub answers: Vec<AnswerDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct DescriptiveAnswer {
    pub answer_id: Uuid,
    pub question_id: Uuid,
    pub question_text: String,
    pub answer: String,
    pub marks_obtained: Option<Decimal>,
    pub max_marks: Decimal,
    pub is_graded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AssessmentStats {
    pub assessment_id: Uuid,
    pub title: String,
    pub attempt_count: i64,
    pub pass_count: i64,
    pub fail_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct RecentAttempt {
    pub attempt_id: Uuid,
    pub candidate_email: String,
    pub assessment_title: String,
    pub status: String,
    pub start_time: DateTime<Utc>,
    pub final_score: Option<Decimal>,
    pub result: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub total_assessments: i64,
    pub total_candidates: i64,
    pub total_attempts: i64,
    pub passed: i64,
    pub failed: i64,
    pub per_assessment: Vec<AssessmentStats>,
    pub recent_attempts: Vec<RecentAttempt>,
}
