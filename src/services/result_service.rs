use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::attempt::AttemptResult;

pub fn passing_marks(total_marks: Decimal, pass_percentage: Decimal) -> Decimal {
    total_marks * pass_percentage / Decimal::ONE_HUNDRED
}

/// PASS when the score reaches the threshold (inclusive). An assessment without
/// marks can never be passed.
pub fn classify(score: Decimal, total_marks: Decimal, pass_percentage: Decimal) -> AttemptResult {
    if total_marks <= Decimal::ZERO {
        return AttemptResult::Fail;
    }
    if score >= passing_marks(total_marks, pass_percentage) {
        AttemptResult::Pass
    } else {
        AttemptResult::Fail
    }
}

#[derive(sqlx::FromRow)]
struct ScoreInputs {
    final_score: Option<Decimal>,
    total_marks: Decimal,
    pass_percentage: Decimal,
}

#[derive(Clone)]
pub struct ResultService {
    pool: PgPool,
}

impl ResultService {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    /// Recomputes PASS/FAIL from the persisted score. Refuses while any answer is
    /// still ungraded, so a result never appears before finalization.
    pub async fn calculate_pass_fail(&self, attempt_id: Uuid) -> Result<AttemptResult> {
        let mut tx = self.pool.begin().await?;
        super::scoring_service::lock_attempt(&mut tx, attempt_id).await?;

        if count_ungraded_in(&mut tx, attempt_id).await? > 0 {
            return Err(Error::NotFinalized);
        }
        let result = calculate_pass_fail_in(&mut tx, attempt_id).await?;
        tx.commit().await?;
        Ok(result)
    }
}

pub(crate) async fn count_ungraded_in(conn: &mut PgConnection, attempt_id: Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"SELECT COUNT(*) FROM answers WHERE attempt_id = $1 AND is_graded = FALSE"#,
    )
    .bind(attempt_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(count)
}

/// Caller must hold the attempt row lock and have checked that every answer is graded.
pub(crate) async fn calculate_pass_fail_in(
    conn: &mut PgConnection,
    attempt_id: Uuid,
) -> Result<AttemptResult> {
    let inputs = sqlx::query_as::<_, ScoreInputs>(
        r#"
        SELECT at.final_score, a.total_marks, a.pass_percentage
        FROM attempts at
        JOIN assessments a ON a.id = at.assessment_id
        WHERE at.id = $1
        "#,
    )
    .bind(attempt_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(Error::AttemptNotFound)?;

    let score = inputs.final_score.unwrap_or(Decimal::ZERO);
    let result = classify(score, inputs.total_marks, inputs.pass_percentage);

    sqlx::query(r#"UPDATE attempts SET result = $1 WHERE id = $2"#)
        .bind(result.as_str())
        .bind(attempt_id)
        .execute(&mut *conn)
        .await?;

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(n: i64) -> Decimal {
        Decimal::from(n)
    }

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(passing_marks(d(10), d(50)), d(5));
        assert_eq!(classify(d(5), d(10), d(50)), AttemptResult::Pass);
        assert_eq!(classify(Decimal::new(499, 2), d(10), d(50)), AttemptResult::Fail);
    }

    #[test]
    fn forty_percent_of_ten() {
        assert_eq!(passing_marks(d(10), d(40)), d(4));
        assert_eq!(classify(d(5), d(10), d(40)), AttemptResult::Pass);
        assert_eq!(classify(d(3), d(10), d(40)), AttemptResult::Fail);
    }

    #[test]
    fn assessment_without_marks_always_fails() {
        assert_eq!(classify(d(0), d(0), d(0)), AttemptResult::Fail);
        assert_eq!(classify(d(0), d(0), d(40)), AttemptResult::Fail);
    }

    #[test]
    fn zero_percent_threshold_passes_any_score() {
        assert_eq!(classify(d(0), d(10), d(0)), AttemptResult::Pass);
    }

    #[test]
    fn fractional_percentages_do_not_round() {
        // 33.33% of 3 = 0.9999
        let pct = Decimal::new(3333, 2);
        assert_eq!(passing_marks(d(3), pct), Decimal::new(9999, 4));
        assert_eq!(classify(d(1), d(3), pct), AttemptResult::Pass);
    }
}
