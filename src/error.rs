use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Assessment not found or inactive")]
    AssessmentNotFound,

    #[error("Assessment code does not match the requested assessment")]
    CodeMismatch,

    #[error("An active attempt already exists: {attempt_id}")]
    DuplicateActiveAttempt { attempt_id: Uuid },

    #[error("No questions configured for this assessment")]
    NoQuestionsConfigured,

    #[error("Attempt not found")]
    AttemptNotFound,

    #[error("Active attempt not found or already submitted")]
    AttemptNotActive,

    #[error("Attempt already submitted")]
    AlreadySubmitted,

    #[error("Attempt has not been submitted yet")]
    AttemptNotSubmitted,

    #[error("Attempt time limit has elapsed; the attempt was submitted automatically")]
    AttemptExpired,

    #[error("Answer not found")]
    AnswerNotFound,

    #[error("Question not found")]
    QuestionNotFound,

    #[error("Invalid marks: {0}")]
    InvalidMarks(String),

    #[error("Invalid answer: {0}")]
    InvalidAnswer(String),

    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Attempt not finalized yet")]
    NotFinalized,

    #[error("Result already published")]
    AlreadyPublished,

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest(_)
            | Error::Validation(_)
            | Error::Json(_)
            | Error::InvalidMarks(_)
            | Error::InvalidAnswer(_)
            | Error::InvalidQuestion(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) | Error::CodeMismatch => StatusCode::FORBIDDEN,
            Error::NotFound(_)
            | Error::AssessmentNotFound
            | Error::AttemptNotFound
            | Error::AnswerNotFound
            | Error::QuestionNotFound => StatusCode::NOT_FOUND,
            Error::Conflict(_)
            | Error::DuplicateActiveAttempt { .. }
            | Error::AttemptNotActive
            | Error::AlreadySubmitted
            | Error::AttemptNotSubmitted
            | Error::AttemptExpired
            | Error::NotFinalized
            | Error::AlreadyPublished => StatusCode::CONFLICT,
            Error::NoQuestionsConfigured
            | Error::Config(_)
            | Error::Database(_)
            | Error::Migrate(_)
            | Error::Internal(_)
            | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code carried in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "configuration_error",
            Error::BadRequest(_) => "bad_request",
            Error::Unauthorized(_) => "unauthorized",
            Error::Forbidden(_) => "forbidden",
            Error::NotFound(_) => "not_found",
            Error::Conflict(_) => "conflict",
            Error::AssessmentNotFound => "assessment_not_found",
            Error::CodeMismatch => "code_mismatch",
            Error::DuplicateActiveAttempt { .. } => "duplicate_active_attempt",
            Error::NoQuestionsConfigured => "no_questions_configured",
            Error::AttemptNotFound => "attempt_not_found",
            Error::AttemptNotActive => "attempt_not_active",
            Error::AlreadySubmitted => "already_submitted",
            Error::AttemptNotSubmitted => "attempt_not_submitted",
            Error::AttemptExpired => "attempt_expired",
            Error::AnswerNotFound => "answer_not_found",
            Error::QuestionNotFound => "question_not_found",
            Error::InvalidMarks(_) => "invalid_marks",
            Error::InvalidAnswer(_) => "invalid_answer",
            Error::InvalidQuestion(_) => "invalid_question",
            Error::NotFinalized => "not_finalized",
            Error::AlreadyPublished => "already_published",
            Error::Validation(_) => "validation_error",
            Error::Json(_) => "invalid_json",
            Error::Database(_) | Error::Migrate(_) | Error::Internal(_) | Error::Io(_) => {
                "internal_error"
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR
            && !matches!(self, Error::NoQuestionsConfigured)
        {
            tracing::error!(error = ?self, "request failed");
            "An unexpected error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = match &self {
            Error::DuplicateActiveAttempt { attempt_id } => json!({
                "error": self.code(),
                "message": message,
                "attemptId": attempt_id,
            }),
            _ => json!({ "error": self.code(), "message": message }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(ref db) if db.code().as_deref() == Some("23505") => {
                Error::Conflict(db.message().to_string())
            }
            sqlx::Error::Database(ref db) if db.code().as_deref() == Some("23503") => {
                Error::NotFound("Referenced record does not exist".to_string())
            }
            other => Error::Database(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_conflicts_map_to_409() {
        for err in [
            Error::AlreadySubmitted,
            Error::AttemptNotActive,
            Error::NotFinalized,
            Error::AlreadyPublished,
            Error::DuplicateActiveAttempt {
                attempt_id: Uuid::nil(),
            },
        ] {
            assert_eq!(err.status_code(), StatusCode::CONFLICT, "{err}");
        }
    }

    #[test]
    fn not_found_and_validation_statuses() {
        assert_eq!(Error::AnswerNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(Error::AttemptNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::InvalidMarks("too high".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(Error::CodeMismatch.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak_details() {
        let resp = Error::Internal("connection refused to 10.0.0.3".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "internal_error");
        assert!(!body["message"].as_str().unwrap().contains("10.0.0.3"));
    }

    #[tokio::test]
    async fn duplicate_attempt_carries_existing_id() {
        let id = Uuid::new_v4();
        let resp = Error::DuplicateActiveAttempt { attempt_id: id }.into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["attemptId"], id.to_string());
    }
}
