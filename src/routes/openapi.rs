use axum::Json;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::dto::attempt_dto::{
    AttemptQuestionsResponse, CandidateResult, GradeAnswerRequest, GradeAnswerResponse,
    PublishAllResponse, PublishResponse, SaveAnswerRequest, SaveAnswerResponse,
    StartAttemptRequest, StartAttemptResponse, SubmitAttemptResponse,
};
use crate::models::attempt::{AttemptResult, AttemptStatus};
use crate::models::question::{PublicOption, PublicQuestion, QuestionType};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::attempt::start_attempt,
        crate::routes::attempt::get_attempt_questions,
        crate::routes::attempt::save_answer,
        crate::routes::attempt::submit_attempt,
        crate::routes::attempt::my_results,
        crate::routes::admin::grade_answer,
        crate::routes::admin::publish_result,
        crate::routes::admin::publish_all_results,
    ),
    components(schemas(
        StartAttemptRequest,
        StartAttemptResponse,
        AttemptQuestionsResponse,
        SaveAnswerRequest,
        SaveAnswerResponse,
        SubmitAttemptResponse,
        GradeAnswerRequest,
        GradeAnswerResponse,
        PublishResponse,
        PublishAllResponse,
        CandidateResult,
        PublicQuestion,
        PublicOption,
        QuestionType,
        AttemptStatus,
        AttemptResult,
    )),
    modifiers(&BearerAuth),
    tags((name = "assessment-backend", description = "Timed assessments: attempts, grading and publication"))
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
