use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::attempt_dto::{
        AttemptQuestionsResponse, CandidateResult, LogViolationRequest, LogViolationResponse,
        SaveAnswerRequest, SaveAnswerResponse, StartAttemptRequest, StartAttemptResponse,
        SubmitAttemptResponse,
    },
    error::Result,
    middleware::auth::AuthUser,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/attempts/start",
    request_body = StartAttemptRequest,
    responses(
        (status = 201, description = "Attempt started", body = StartAttemptResponse),
        (status = 403, description = "Assessment code does not match the assessment id"),
        (status = 404, description = "No active assessment with this code"),
        (status = 409, description = "An attempt is already in progress; body carries attemptId"),
        (status = 500, description = "Assessment has no questions configured"),
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn start_attempt(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<StartAttemptRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let started = state
        .attempt_service
        .start_attempt(user.user_id, &payload.assessment_code, payload.assessment_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(StartAttemptResponse {
            attempt_id: started.attempt_id,
            duration_minutes: started.duration_minutes,
            questions: started.questions,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/attempts/{attempt_id}/questions",
    params(("attempt_id" = Uuid, Path, description = "Attempt ID")),
    responses(
        (status = 200, description = "Questions of the attempt, without correct answers", body = AttemptQuestionsResponse),
        (status = 404, description = "Attempt not found"),
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn get_attempt_questions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(attempt_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let paper = state
        .attempt_service
        .attempt_questions(attempt_id, user.user_id)
        .await?;

    Ok(Json(AttemptQuestionsResponse {
        attempt_id: paper.attempt_id,
        status: paper.status,
        duration_minutes: paper.duration_minutes,
        start_time: paper.start_time,
        deadline: paper.deadline,
        questions: paper.questions,
    }))
}

#[utoipa::path(
    post,
    path = "/api/attempts/{attempt_id}/answers",
    params(("attempt_id" = Uuid, Path, description = "Attempt ID")),
    request_body = SaveAnswerRequest,
    responses(
        (status = 200, description = "Answer saved", body = SaveAnswerResponse),
        (status = 400, description = "Value is not an option of this MCQ"),
        (status = 404, description = "Question is not part of this assessment"),
        (status = 409, description = "Attempt is not active, or its time limit elapsed"),
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn save_answer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(attempt_id): Path<Uuid>,
    Json(payload): Json<SaveAnswerRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let answer_id = state
        .attempt_service
        .save_answer(attempt_id, user.user_id, payload.question_id, &payload.answer)
        .await?;
    Ok(Json(SaveAnswerResponse { answer_id }))
}

#[utoipa::path(
    post,
    path = "/api/attempts/{attempt_id}/submit",
    params(("attempt_id" = Uuid, Path, description = "Attempt ID")),
    responses(
        (status = 200, description = "Attempt submitted; verdict withheld until published", body = SubmitAttemptResponse),
        (status = 404, description = "Attempt not found"),
        (status = 409, description = "Attempt already submitted"),
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn submit_attempt(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(attempt_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let score = state
        .attempt_service
        .submit_attempt(attempt_id, user.user_id)
        .await?;
    Ok(Json(SubmitAttemptResponse { score }))
}

#[axum::debug_handler]
pub async fn log_violation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<LogViolationRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let violation_id = state
        .violation_service
        .log_violation(payload.attempt_id, user.user_id, &payload.violation_type)
        .await?;
    Ok((StatusCode::CREATED, Json(LogViolationResponse { violation_id })))
}

#[utoipa::path(
    get,
    path = "/api/results",
    responses(
        (status = 200, description = "Published results of the caller", body = [CandidateResult]),
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn my_results(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let results = state
        .publication_service
        .candidate_results(user.user_id)
        .await?;
    Ok(Json(results))
}
