use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::attempt::{AttemptResult, AttemptStatus};

use super::result_service::{calculate_pass_fail_in, count_ungraded_in};
use super::scoring_service::{calculate_final_score_in, lock_attempt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finalization {
    pub finalized: bool,
    pub result: Option<AttemptResult>,
    pub final_score: Option<Decimal>,
}

impl Finalization {
    fn pending() -> Self {
        Self {
            finalized: false,
            result: None,
            final_score: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeOutcome {
    pub attempt_id: Uuid,
    pub finalized: bool,
    pub result: Option<AttemptResult>,
    pub final_score: Option<Decimal>,
}

#[derive(sqlx::FromRow)]
struct GradingTarget {
    attempt_id: Uuid,
    question_type: String,
    max_marks: Decimal,
}

#[derive(sqlx::FromRow)]
struct LockedAttempt {
    status: String,
    is_published: bool,
}

#[derive(Clone)]
pub struct FinalizationService {
    pool: PgPool,
}

impl FinalizationService {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    pub async fn finalize_attempt_if_complete(&self, attempt_id: Uuid) -> Result<Finalization> {
        let mut tx = self.pool.begin().await?;
        lock_attempt(&mut tx, attempt_id).await?;
        let outcome = finalize_in(&mut tx, attempt_id).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    /// Records manual marks for a descriptive answer and finalizes the attempt
    /// if that was the last ungraded answer. The whole sequence runs under the
    /// attempt row lock, so concurrent gradings of the same attempt serialize
    /// and exactly the last one observes completion.
    pub async fn grade_descriptive_answer(
        &self,
        answer_id: Uuid,
        marks: Decimal,
    ) -> Result<GradeOutcome> {
        if marks < Decimal::ZERO {
            return Err(Error::InvalidMarks("marks cannot be negative".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let target = sqlx::query_as::<_, GradingTarget>(
            r#"
            SELECT a.attempt_id, q.question_type, q.marks AS max_marks
            FROM answers a
            JOIN questions q ON q.id = a.question_id
            WHERE a.id = $1
            "#,
        )
        .bind(answer_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(Error::AnswerNotFound)?;

        let attempt = sqlx::query_as::<_, LockedAttempt>(
            r#"SELECT status, is_published FROM attempts WHERE id = $1 FOR UPDATE"#,
        )
        .bind(target.attempt_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(Error::AttemptNotFound)?;

        if attempt.status.parse::<AttemptStatus>()? != AttemptStatus::Submitted {
            return Err(Error::AttemptNotSubmitted);
        }
        if attempt.is_published {
            return Err(Error::AlreadyPublished);
        }
        if target.question_type != "DESCRIPTIVE" {
            return Err(Error::BadRequest(
                "MCQ answers are graded automatically".to_string(),
            ));
        }
        if marks > target.max_marks {
            return Err(Error::InvalidMarks(format!(
                "marks {} exceed the question maximum of {}",
                marks, target.max_marks
            )));
        }

        sqlx::query(
            r#"UPDATE answers SET marks_obtained = $1, is_graded = TRUE, updated_at = NOW() WHERE id = $2"#,
        )
        .bind(marks)
        .bind(answer_id)
        .execute(&mut *tx)
        .await?;

        let finalization = finalize_in(&mut tx, target.attempt_id).await?;
        tx.commit().await?;

        tracing::info!(
            %answer_id,
            attempt_id = %target.attempt_id,
            %marks,
            finalized = finalization.finalized,
            "Descriptive answer graded"
        );

        Ok(GradeOutcome {
            attempt_id: target.attempt_id,
            finalized: finalization.finalized,
            result: finalization.result,
            final_score: finalization.final_score,
        })
    }
}

/// Caller must hold the attempt row lock. Leaves score and result untouched
/// while any answer is ungraded.
pub(crate) async fn finalize_in(conn: &mut PgConnection, attempt_id: Uuid) -> Result<Finalization> {
    if count_ungraded_in(conn, attempt_id).await? > 0 {
        return Ok(Finalization::pending());
    }

    let final_score = calculate_final_score_in(conn, attempt_id).await?;
    let result = calculate_pass_fail_in(conn, attempt_id).await?;

    tracing::info!(%attempt_id, %final_score, result = result.as_str(), "Attempt finalized");

    Ok(Finalization {
        finalized: true,
        result: Some(result),
        final_score: Some(final_score),
    })
}
