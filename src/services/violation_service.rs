use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::violation::Violation;

/// Append-only proctoring log. Has no effect on an attempt's status or score.
#[derive(Clone)]
pub struct ViolationService {
    pool: PgPool,
}

impl ViolationService {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    pub async fn log_violation(
        &self,
        attempt_id: Uuid,
        candidate_id: Uuid,
        violation_type: &str,
    ) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO violations (attempt_id, violation_type)
            SELECT id, $3 FROM attempts WHERE id = $1 AND candidate_id = $2
            RETURNING id
            "#,
        )
        .bind(attempt_id)
        .bind(candidate_id)
        .bind(violation_type.trim())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::AttemptNotFound)?;

        tracing::info!(%attempt_id, violation_type, "Proctoring violation recorded");
        Ok(id)
    }

    pub async fn list_violations(&self, attempt_id: Uuid) -> Result<Vec<Violation>> {
        let violations = sqlx::query_as::<_, Violation>(
            r#"SELECT * FROM violations WHERE attempt_id = $1 ORDER BY created_at, id"#,
        )
        .bind(attempt_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(violations)
    }
}
