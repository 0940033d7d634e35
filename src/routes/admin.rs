use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        admin_dto::{
            AddCandidateResponse, AddQuestionResponse, BulkCandidatesRequest,
            BulkQuestionsRequest, BulkQuestionsResponse, CandidatePayload,
            CreateAssessmentRequest, CreateAssessmentResponse, DeleteQuestionResponse,
            QuestionPayload, UpdateAssessmentRequest,
        },
        attempt_dto::{GradeAnswerRequest, GradeAnswerResponse, PublishAllResponse, PublishResponse},
    },
    error::Result,
    AppState,
};

#[axum::debug_handler]
pub async fn create_assessment(
    State(state): State<AppState>,
    Json(payload): Json<CreateAssessmentRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let assessment = state.assessment_service.create_assessment(&payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateAssessmentResponse {
            assessment_id: assessment.id,
            code: assessment.code,
        }),
    ))
}

#[axum::debug_handler]
pub async fn list_assessments(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.assessment_service.list_assessments().await?))
}

#[axum::debug_handler]
pub async fn get_assessment(
    State(state): State<AppState>,
    Path(assessment_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.assessment_service.get_assessment(assessment_id).await?))
}

#[axum::debug_handler]
pub async fn update_assessment(
    State(state): State<AppState>,
    Path(assessment_id): Path<Uuid>,
    Json(payload): Json<UpdateAssessmentRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let assessment = state
        .assessment_service
        .update_assessment(assessment_id, &payload)
        .await?;
    Ok(Json(assessment))
}

#[axum::debug_handler]
pub async fn add_question(
    State(state): State<AppState>,
    Path(assessment_id): Path<Uuid>,
    Json(payload): Json<QuestionPayload>,
) -> Result<impl IntoResponse> {
    let (question_id, total_marks) = state
        .question_service
        .add_question(assessment_id, &payload)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(AddQuestionResponse {
            question_id,
            total_marks,
        }),
    ))
}

#[axum::debug_handler]
pub async fn bulk_add_questions(
    State(state): State<AppState>,
    Path(assessment_id): Path<Uuid>,
    Json(payload): Json<BulkQuestionsRequest>,
) -> Result<impl IntoResponse> {
    let (inserted_count, total_marks) = state
        .question_service
        .bulk_add_questions(assessment_id, &payload.questions)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(BulkQuestionsResponse {
            inserted_count,
            total_marks,
        }),
    ))
}

#[axum::debug_handler]
pub async fn list_questions(
    State(state): State<AppState>,
    Path(assessment_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.question_service.list_questions(assessment_id).await?))
}

#[axum::debug_handler]
pub async fn delete_question(
    State(state): State<AppState>,
    Path((assessment_id, question_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    let total_marks = state
        .question_service
        .delete_question(assessment_id, question_id)
        .await?;
    Ok(Json(DeleteQuestionResponse {
        deleted: true,
        total_marks,
    }))
}

#[axum::debug_handler]
pub async fn add_candidate(
    State(state): State<AppState>,
    Json(payload): Json<CandidatePayload>,
) -> Result<impl IntoResponse> {
    let candidate_id = state.candidate_service.add_candidate(&payload).await?;
    Ok((StatusCode::CREATED, Json(AddCandidateResponse { candidate_id })))
}

#[axum::debug_handler]
pub async fn bulk_add_candidates(
    State(state): State<AppState>,
    Json(payload): Json<BulkCandidatesRequest>,
) -> Result<impl IntoResponse> {
    let counts = state
        .candidate_service
        .bulk_add_candidates(&payload.candidates)
        .await?;
    Ok(Json(counts))
}

#[axum::debug_handler]
pub async fn list_candidates(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.candidate_service.list_candidates().await?))
}

#[axum::debug_handler]
pub async fn list_attempts(
    State(state): State<AppState>,
    Path(assessment_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.attempt_service.list_attempts(assessment_id).await?))
}

#[axum::debug_handler]
pub async fn attempt_summary(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.attempt_service.attempt_summary(attempt_id).await?))
}

#[axum::debug_handler]
pub async fn attempt_details(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.attempt_service.attempt_details(attempt_id).await?))
}

#[axum::debug_handler]
pub async fn descriptive_answers(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.attempt_service.descriptive_answers(attempt_id).await?))
}

#[axum::debug_handler]
pub async fn list_violations(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.violation_service.list_violations(attempt_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/answers/grade",
    request_body = GradeAnswerRequest,
    responses(
        (status = 200, description = "Answer graded; finalization outcome included", body = GradeAnswerResponse),
        (status = 400, description = "Marks outside [0, question marks], or answer is an MCQ"),
        (status = 404, description = "Answer not found"),
        (status = 409, description = "Attempt not submitted yet, or already published"),
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn grade_answer(
    State(state): State<AppState>,
    Json(payload): Json<GradeAnswerRequest>,
) -> Result<impl IntoResponse> {
    let outcome = state
        .finalization_service
        .grade_descriptive_answer(payload.answer_id, payload.marks)
        .await?;
    Ok(Json(GradeAnswerResponse {
        attempt_id: outcome.attempt_id,
        finalized: outcome.finalized,
        result: outcome.result,
        final_score: outcome.final_score,
    }))
}

#[utoipa::path(
    post,
    path = "/api/admin/attempts/{attempt_id}/publish",
    params(("attempt_id" = Uuid, Path, description = "Attempt ID")),
    responses(
        (status = 200, description = "Result published", body = PublishResponse),
        (status = 404, description = "Attempt not found"),
        (status = 409, description = "Not finalized, or already published"),
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn publish_result(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.publication_service.publish_result(attempt_id).await?;
    Ok(Json(PublishResponse { published: true }))
}

#[utoipa::path(
    post,
    path = "/api/admin/assessments/{assessment_id}/publish-all",
    params(("assessment_id" = Uuid, Path, description = "Assessment ID")),
    responses(
        (status = 200, description = "Number of results published", body = PublishAllResponse),
        (status = 404, description = "Assessment not found"),
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn publish_all_results(
    State(state): State<AppState>,
    Path(assessment_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let count = state
        .publication_service
        .publish_all_results(assessment_id)
        .await?;
    Ok(Json(PublishAllResponse { count }))
}

#[axum::debug_handler]
pub async fn dashboard_stats(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.stats_service.dashboard_stats().await?))
}
