pub mod admin;
pub mod attempt;
pub mod health;
pub mod openapi;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware::{
    auth::{require_admin, require_candidate},
    cors::cors_layer,
    rate_limit::{new_rps_state, rps_middleware},
};
use crate::AppState;

const BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    let candidate_api = Router::new()
        .route("/api/attempts/start", post(attempt::start_attempt))
        .route(
            "/api/attempts/:attempt_id/questions",
            get(attempt::get_attempt_questions),
        )
        .route("/api/attempts/:attempt_id/answers", post(attempt::save_answer))
        .route("/api/attempts/:attempt_id/submit", post(attempt::submit_attempt))
        .route("/api/violations", post(attempt::log_violation))
        .route("/api/results", get(attempt::my_results))
        // Layers run bottom-up: authentication first, then the per-subject limiter.
        .route_layer(from_fn_with_state(
            new_rps_state(state.config.rate_limit_rps),
            rps_middleware,
        ))
        .route_layer(from_fn_with_state(state.clone(), require_candidate));

    let admin_api = Router::new()
        .route(
            "/api/admin/assessments",
            get(admin::list_assessments).post(admin::create_assessment),
        )
        .route(
            "/api/admin/assessments/:assessment_id",
            get(admin::get_assessment).patch(admin::update_assessment),
        )
        .route(
            "/api/admin/assessments/:assessment_id/questions",
            get(admin::list_questions).post(admin::add_question),
        )
        .route(
            "/api/admin/assessments/:assessment_id/questions/bulk",
            post(admin::bulk_add_questions),
        )
        .route(
            "/api/admin/assessments/:assessment_id/questions/:question_id",
            delete(admin::delete_question),
        )
        .route(
            "/api/admin/assessments/:assessment_id/attempts",
            get(admin::list_attempts),
        )
        .route(
            "/api/admin/assessments/:assessment_id/publish-all",
            post(admin::publish_all_results),
        )
        .route("/api/admin/attempts/:attempt_id", get(admin::attempt_summary))
        .route(
            "/api/admin/attempts/:attempt_id/details",
            get(admin::attempt_details),
        )
        .route(
            "/api/admin/attempts/:attempt_id/descriptive",
            get(admin::descriptive_answers),
        )
        .route(
            "/api/admin/attempts/:attempt_id/violations",
            get(admin::list_violations),
        )
        .route(
            "/api/admin/attempts/:attempt_id/publish",
            post(admin::publish_result),
        )
        .route("/api/admin/answers/grade", post(admin::grade_answer))
        .route(
            "/api/admin/candidates",
            get(admin::list_candidates).post(admin::add_candidate),
        )
        .route("/api/admin/candidates/bulk", post(admin::bulk_add_candidates))
        .route("/api/admin/dashboard-stats", get(admin::dashboard_stats))
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    let cors = cors_layer(&state.config.cors_allowed_origins);

    Router::new()
        .route("/health", get(health::health))
        .route("/api/openapi.json", get(openapi::openapi_json))
        .merge(candidate_api)
        .merge(admin_api)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}
