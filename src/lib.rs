pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::services::{
    assessment_service::AssessmentService, attempt_service::AttemptService,
    candidate_service::CandidateService, finalization_service::FinalizationService,
    publication_service::PublicationService, question_service::QuestionService,
    stats_service::StatsService, violation_service::ViolationService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub attempt_service: AttemptService,
    pub finalization_service: FinalizationService,
    pub publication_service: PublicationService,
    pub assessment_service: AssessmentService,
    pub question_service: QuestionService,
    pub candidate_service: CandidateService,
    pub violation_service: ViolationService,
    pub stats_service: StatsService,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        let attempt_service = AttemptService::new(pool.clone(), config.attempt_grace_seconds);
        let finalization_service = FinalizationService::new(pool.clone());
        let publication_service = PublicationService::new(pool.clone());
        let assessment_service = AssessmentService::new(pool.clone());
        let question_service = QuestionService::new(pool.clone());
        let candidate_service = CandidateService::new(pool.clone());
        let violation_service = ViolationService::new(pool.clone());
        let stats_service = StatsService::new(pool.clone());

        Self {
            pool,
            config,
            attempt_service,
            finalization_service,
            publication_service,
            assessment_service,
            question_service,
            candidate_service,
            violation_service,
            stats_service,
        }
    }
}
