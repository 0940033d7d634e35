#![allow(dead_code)]

use assessment_backend::{
    config::{Config, LogFormat},
    database::pool::run_migrations,
    dto::admin_dto::{CandidatePayload, CreateAssessmentRequest, QuestionPayload},
    models::assessment::Assessment,
    services::{
        assessment_service::AssessmentService, candidate_service::CandidateService,
        question_service::QuestionService,
    },
    AppState,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

pub const JWT_SECRET: &str = "test_secret_key";

/// Connects to `DATABASE_URL` and applies migrations. Returns `None` when no
/// database is configured so the calling test can skip itself.
pub async fn test_pool() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            eprintln!("DATABASE_URL not set; skipping database test");
            return None;
        }
    };
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&url)
        .await
        .expect("connect to test database");
    run_migrations(&pool).await.expect("migrations");
    Some(pool)
}

pub fn test_config() -> Config {
    Config {
        server_address: "127.0.0.1:0".into(),
        database_url: std::env::var("DATABASE_URL").unwrap_or_default(),
        jwt_secret: JWT_SECRET.into(),
        database_max_connections: 8,
        rate_limit_rps: 1000,
        attempt_grace_seconds: 0,
        deadline_sweep_seconds: 0,
        log_format: LogFormat::Text,
        cors_allowed_origins: Vec::new(),
    }
}

pub fn test_state(pool: PgPool) -> AppState {
    AppState::new(pool, test_config())
}

pub fn token(user_id: Uuid, role: &str) -> String {
    let exp = (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize;
    encode(
        &Header::default(),
        &json!({ "sub": user_id.to_string(), "exp": exp, "role": role }),
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("encode token")
}

pub fn unique_code() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_uppercase()
}

pub fn mcq(text: &str, marks: i64, options: &[&str], correct: &str) -> QuestionPayload {
    QuestionPayload {
        question_text: text.into(),
        question_type: "MCQ".into(),
        marks: Decimal::from(marks),
        options: Some(options.iter().map(|s| s.to_string()).collect()),
        correct_answer: Some(correct.into()),
    }
}

pub fn descriptive(text: &str, marks: i64) -> QuestionPayload {
    QuestionPayload {
        question_text: text.into(),
        question_type: "DESCRIPTIVE".into(),
        marks: Decimal::from(marks),
        options: None,
        correct_answer: None,
    }
}

pub async fn seed_candidate(pool: &PgPool) -> Uuid {
    let id = Uuid::new_v4();
    CandidateService::new(pool.clone())
        .add_candidate(&CandidatePayload {
            email: format!("cand_{}@example.com", id.simple()),
            full_name: Some("Test Candidate".into()),
        })
        .await
        .expect("seed candidate")
}

pub async fn seed_admin(pool: &PgPool) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(r#"INSERT INTO users (id, email, full_name, role) VALUES ($1, $2, 'Admin', 'ADMIN')"#)
        .bind(id)
        .bind(format!("admin_{}@example.com", id.simple()))
        .execute(pool)
        .await
        .expect("seed admin");
    id
}

/// Creates an active assessment with the given questions (in order).
pub async fn seed_assessment(
    pool: &PgPool,
    pass_percentage: i64,
    duration_minutes: i32,
    questions: &[QuestionPayload],
) -> Assessment {
    let assessment = AssessmentService::new(pool.clone())
        .create_assessment(&CreateAssessmentRequest {
            title: "Seeded assessment".into(),
            duration_minutes,
            pass_percentage: Some(Decimal::from(pass_percentage)),
            code: Some(unique_code()),
        })
        .await
        .expect("seed assessment");
    if !questions.is_empty() {
        QuestionService::new(pool.clone())
            .bulk_add_questions(assessment.id, questions)
            .await
            .expect("seed questions");
    }
    assessment
}

/// Question ids of an assessment in creation order.
pub async fn question_ids(pool: &PgPool, assessment_id: Uuid) -> Vec<Uuid> {
    sqlx::query_scalar(
        r#"SELECT id FROM questions WHERE assessment_id = $1 ORDER BY created_at, id"#,
    )
    .bind(assessment_id)
    .fetch_all(pool)
    .await
    .expect("question ids")
}

pub async fn answer_id(pool: &PgPool, attempt_id: Uuid, question_id: Uuid) -> Uuid {
    sqlx::query_scalar(r#"SELECT id FROM answers WHERE attempt_id = $1 AND question_id = $2"#)
        .bind(attempt_id)
        .bind(question_id)
        .fetch_one(pool)
        .await
        .expect("answer id")
}

#[derive(Debug, sqlx::FromRow)]
pub struct AttemptRow {
    pub status: String,
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
    pub final_score: Option<Decimal>,
    pub result: Option<String>,
    pub is_published: bool,
}

pub async fn attempt_row(pool: &PgPool, attempt_id: Uuid) -> AttemptRow {
    sqlx::query_as::<_, AttemptRow>(
        r#"SELECT status, end_time, final_score, result, is_published FROM attempts WHERE id = $1"#,
    )
    .bind(attempt_id)
    .fetch_one(pool)
    .await
    .expect("attempt row")
}
