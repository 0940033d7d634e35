use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::question::OptionKey;

/// Marks for a single MCQ answer: full marks on an exact key match, zero otherwise.
/// Anything that is not a valid option key simply scores zero.
pub fn grade_mcq(submitted: &str, correct_answer: OptionKey, marks: Decimal) -> Decimal {
    match submitted.parse::<OptionKey>() {
        Ok(key) if key == correct_answer => marks,
        _ => Decimal::ZERO,
    }
}

/// Sum of obtained marks; ungraded answers (`None`) count as zero.
pub fn total_score<I>(marks: I) -> Decimal
where
    I: IntoIterator<Item = Option<Decimal>>,
{
    marks.into_iter().flatten().sum()
}

#[derive(sqlx::FromRow)]
struct McqAnswerRow {
    id: Uuid,
    answer: String,
    correct_answer: Option<String>,
    marks: Decimal,
}

#[derive(Clone)]
pub struct ScoringService {
    pool: PgPool,
}

impl ScoringService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Grades every MCQ answer of the attempt. Returns how many answers were graded.
    pub async fn auto_grade_mcqs(&self, attempt_id: Uuid) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        lock_attempt(&mut tx, attempt_id).await?;
        let graded = auto_grade_mcqs_in(&mut tx, attempt_id).await?;
        tx.commit().await?;
        Ok(graded)
    }

    /// Recomputes and persists `final_score` from the current answers.
    pub async fn calculate_final_score(&self, attempt_id: Uuid) -> Result<Decimal> {
        let mut tx = self.pool.begin().await?;
        lock_attempt(&mut tx, attempt_id).await?;
        let score = calculate_final_score_in(&mut tx, attempt_id).await?;
        tx.commit().await?;
        Ok(score)
    }
}

pub(crate) async fn lock_attempt(conn: &mut PgConnection, attempt_id: Uuid) -> Result<()> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM attempts WHERE id = $1 FOR UPDATE")
        .bind(attempt_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(Error::AttemptNotFound)?;
    Ok(())
}

/// Caller must hold the attempt row lock.
pub(crate) async fn auto_grade_mcqs_in(conn: &mut PgConnection, attempt_id: Uuid) -> Result<u64> {
    let rows = sqlx::query_as::<_, McqAnswerRow>(
        r#"
        SELECT a.id, a.answer, q.correct_answer, q.marks
        FROM answers a
        JOIN questions q ON q.id = a.question_id
        WHERE a.attempt_id = $1 AND q.question_type = 'MCQ'
        "#,
    )
    .bind(attempt_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut graded = 0;
    for row in rows {
        let correct: OptionKey = row
            .correct_answer
            .as_deref()
            .unwrap_or_default()
            .parse()
            .map_err(|_| {
                Error::Internal(format!("MCQ answer {} has no valid correct key", row.id))
            })?;
        let marks = grade_mcq(&row.answer, correct, row.marks);

        sqlx::query(
            r#"UPDATE answers SET marks_obtained = $1, is_graded = TRUE, updated_at = NOW() WHERE id = $2"#,
        )
        .bind(marks)
        .bind(row.id)
        .execute(&mut *conn)
        .await?;
        graded += 1;
    }

    tracing::debug!(%attempt_id, graded, "MCQ answers auto-graded");
    Ok(graded)
}

/// Caller must hold the attempt row lock.
pub(crate) async fn calculate_final_score_in(
    conn: &mut PgConnection,
    attempt_id: Uuid,
) -> Result<Decimal> {
    let marks: Vec<Option<Decimal>> = sqlx::query_scalar(
        r#"SELECT CASE WHEN is_graded THEN marks_obtained END FROM answers WHERE attempt_id = $1"#,
    )
    .bind(attempt_id)
    .fetch_all(&mut *conn)
    .await?;

    let score = total_score(marks);

    let updated = sqlx::query(r#"UPDATE attempts SET final_score = $1 WHERE id = $2"#)
        .bind(score)
        .bind(attempt_id)
        .execute(&mut *conn)
        .await?;
    if updated.rows_affected() == 0 {
        return Err(Error::AttemptNotFound);
    }

    Ok(score)
}
