use sqlx::PgPool;

use crate::dto::admin_dto::{AssessmentStats, DashboardStats, RecentAttempt};
use crate::error::Result;

#[derive(sqlx::FromRow)]
struct Totals {
    total_assessments: i64,
    total_candidates: i64,
    total_attempts: i64,
    passed: i64,
    failed: i64,
}

#[derive(Clone)]
pub struct StatsService {
    pool: PgPool,
}

impl StatsService {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        let totals = sqlx::query_as::<_, Totals>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM assessments) AS total_assessments,
                (SELECT COUNT(*) FROM users WHERE role = 'CANDIDATE') AS total_candidates,
                (SELECT COUNT(*) FROM attempts) AS total_attempts,
                (SELECT COUNT(*) FROM attempts WHERE result = 'PASS') AS passed,
                (SELECT COUNT(*) FROM attempts WHERE result = 'FAIL') AS failed
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let per_assessment = sqlx::query_as::<_, AssessmentStats>(
            r#"
            SELECT a.id AS assessment_id, a.title,
                   COUNT(at.id) AS attempt_count,
                   COUNT(at.id) FILTER (WHERE at.result = 'PASS') AS pass_count,
                   COUNT(at.id) FILTER (WHERE at.result = 'FAIL') AS fail_count
            FROM assessments a
            LEFT JOIN attempts at ON at.assessment_id = a.id
            GROUP BY a.id, a.title
            ORDER BY a.title
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let recent_attempts = sqlx::query_as::<_, RecentAttempt>(
            r#"
            SELECT at.id AS attempt_id, u.email AS candidate_email, a.title AS assessment_title,
                   at.status, at.start_time, at.final_score, at.result
            FROM attempts at
            JOIN users u ON u.id = at.candidate_id
            JOIN assessments a ON a.id = at.assessment_id
            ORDER BY at.start_time DESC
            LIMIT 10
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(DashboardStats {
            total_assessments: totals.total_assessments,
            total_candidates: totals.total_candidates,
            total_attempts: totals.total_attempts,
            passed: totals.passed,
            failed: totals.failed,
            per_assessment,
            recent_attempts,
        })
    }
}
