use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::attempt_dto::CandidateResult;
use crate::error::{Error, Result};

#[derive(sqlx::FromRow)]
struct PublicationState {
    result: Option<String>,
    is_published: bool,
}

#[derive(Clone)]
pub struct PublicationService {
    pool: PgPool,
}

impl PublicationService {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    pub async fn publish_result(&self, attempt_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let state = sqlx::query_as::<_, PublicationState>(
            r#"SELECT result, is_published FROM attempts WHERE id = $1 FOR UPDATE"#,
        )
        .bind(attempt_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(Error::AttemptNotFound)?;

        if state.result.is_none() {
            return Err(Error::NotFinalized);
        }
        if state.is_published {
            return Err(Error::AlreadyPublished);
        }

        sqlx::query(r#"UPDATE attempts SET is_published = TRUE WHERE id = $1"#)
            .bind(attempt_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(%attempt_id, "Result published");
        Ok(())
    }

    /// Publishes every finalized, unpublished attempt of the assessment and
    /// returns how many were published. Attempts without a result are skipped.
    pub async fn publish_all_results(&self, assessment_id: Uuid) -> Result<u64> {
        let exists: Option<Uuid> =
            sqlx::query_scalar(r#"SELECT id FROM assessments WHERE id = $1"#)
                .bind(assessment_id)
                .fetch_optional(&self.pool)
                .await?;
        if exists.is_none() {
            return Err(Error::AssessmentNotFound);
        }

        let published = sqlx::query(
            r#"
            UPDATE attempts
            SET is_published = TRUE
            WHERE assessment_id = $1 AND result IS NOT NULL AND is_published = FALSE
            "#,
        )
        .bind(assessment_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        tracing::info!(%assessment_id, published, "Bulk result publication");
        Ok(published)
    }

    /// Results visible to the candidate: published attempts only.
    pub async fn candidate_results(&self, candidate_id: Uuid) -> Result<Vec<CandidateResult>> {
        let results = sqlx::query_as::<_, CandidateResult>(
            r#"
            SELECT at.id AS attempt_id, a.id AS assessment_id, a.title AS assessment_title,
                   at.final_score, a.total_marks, at.result, at.end_time
            FROM attempts at
            JOIN assessments a ON a.id = at.assessment_id
            WHERE at.candidate_id = $1 AND at.is_published = TRUE
            ORDER BY at.end_time DESC
            "#,
        )
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(results)
    }
}
