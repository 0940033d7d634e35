use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::dto::admin_dto::{
    AnswerDetail, AttemptDetails, AttemptListItem, AttemptSummary, DescriptiveAnswer,
};
use crate::error::{Error, Result};
use crate::models::assessment::Assessment;
use crate::models::attempt::{attempt_deadline, Attempt, AttemptStatus};
use crate::models::question::{PublicQuestion, Question, QuestionKind, QuestionRow};
use crate::utils::code::normalize_assessment_code;

use super::finalization_service::finalize_in;
use super::scoring_service::{auto_grade_mcqs_in, calculate_final_score_in};

#[derive(Debug, Clone)]
pub struct StartedAttempt {
    pub attempt_id: Uuid,
    pub duration_minutes: i32,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Clone)]
pub struct AttemptPaper {
    pub attempt_id: Uuid,
    pub status: AttemptStatus,
    pub duration_minutes: i32,
    pub start_time: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub questions: Vec<PublicQuestion>,
}

#[derive(sqlx::FromRow)]
struct ActiveAttemptRow {
    assessment_id: Uuid,
    status: String,
    start_time: DateTime<Utc>,
    duration_minutes: i32,
}

#[derive(Clone)]
pub struct AttemptService {
    pool: PgPool,
    grace_seconds: i64,
}

impl AttemptService {
    pub fn new(pool: PgPool, grace_seconds: i64) -> Self {
        Self {
            pool,
            grace_seconds,
        }
    }

    pub async fn start_attempt(
        &self,
        candidate_id: Uuid,
        assessment_code: &str,
        assessment_id: Option<Uuid>,
    ) -> Result<StartedAttempt> {
        let code = normalize_assessment_code(assessment_code)?;
        let mut tx = self.pool.begin().await?;

        let assessment = match assessment_id {
            Some(id) => {
                let assessment = sqlx::query_as::<_, Assessment>(
                    r#"SELECT * FROM assessments WHERE id = $1 AND status = 'ACTIVE'"#,
                )
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(Error::AssessmentNotFound)?;
                if assessment.code != code {
                    tracing::warn!(%candidate_id, assessment_id = %id, "Assessment code mismatch");
                    return Err(Error::CodeMismatch);
                }
                assessment
            }
            None => sqlx::query_as::<_, Assessment>(
                r#"SELECT * FROM assessments WHERE code = $1 AND status = 'ACTIVE'"#,
            )
            .bind(&code)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(Error::AssessmentNotFound)?,
        };

        if let Some(existing) = find_active_attempt(&mut tx, candidate_id, assessment.id).await? {
            return Err(Error::DuplicateActiveAttempt {
                attempt_id: existing,
            });
        }

        let questions = load_questions(&mut tx, assessment.id).await?;
        if questions.is_empty() {
            tracing::error!(assessment_id = %assessment.id, "Assessment has no questions configured");
            return Err(Error::NoQuestionsConfigured);
        }

        let inserted: Option<Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO attempts (candidate_id, assessment_id, status, start_time)
            VALUES ($1, $2, 'IN_PROGRESS', NOW())
            ON CONFLICT (candidate_id, assessment_id) WHERE status = 'IN_PROGRESS' DO NOTHING
            RETURNING id
            "#,
        )
        .bind(candidate_id)
        .bind(assessment.id)
        .fetch_optional(&mut *tx)
        .await?;

        let attempt_id = match inserted {
            Some(id) => id,
            None => {
                // Lost a race against a concurrent start for the same pair.
                let existing = find_active_attempt(&mut tx, candidate_id, assessment.id)
                    .await?
                    .ok_or_else(|| {
                        Error::Internal("active attempt vanished after conflict".to_string())
                    })?;
                return Err(Error::DuplicateActiveAttempt {
                    attempt_id: existing,
                });
            }
        };

        tx.commit().await?;

        tracing::info!(
            %attempt_id,
            %candidate_id,
            assessment_id = %assessment.id,
            questions = questions.len(),
            "Attempt started"
        );

        Ok(StartedAttempt {
            attempt_id,
            duration_minutes: assessment.duration_minutes,
            questions: questions.iter().map(Question::public_view).collect(),
        })
    }

    /// Upserts the candidate's answer for one question. A save that arrives after
    /// the deadline submits the attempt instead and reports `AttemptExpired`.
    pub async fn save_answer(
        &self,
        attempt_id: Uuid,
        candidate_id: Uuid,
        question_id: Uuid,
        value: &str,
    ) -> Result<Uuid> {
        let mut tx = self.pool.begin().await?;

        let attempt = sqlx::query_as::<_, ActiveAttemptRow>(
            r#"
            SELECT at.assessment_id, at.status, at.start_time, a.duration_minutes
            FROM attempts at
            JOIN assessments a ON a.id = at.assessment_id
            WHERE at.id = $1 AND at.candidate_id = $2
            FOR UPDATE OF at
            "#,
        )
        .bind(attempt_id)
        .bind(candidate_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(Error::AttemptNotActive)?;

        if attempt.status.parse::<AttemptStatus>()? != AttemptStatus::InProgress {
            return Err(Error::AttemptNotActive);
        }

        let deadline =
            attempt_deadline(attempt.start_time, attempt.duration_minutes, self.grace_seconds);
        if Utc::now() > deadline {
            let score = submit_in(&mut tx, attempt_id).await?;
            tx.commit().await?;
            tracing::warn!(%attempt_id, %score, "Late answer; attempt submitted automatically");
            return Err(Error::AttemptExpired);
        }

        let row = sqlx::query_as::<_, QuestionRow>(
            r#"SELECT * FROM questions WHERE id = $1 AND assessment_id = $2"#,
        )
        .bind(question_id)
        .bind(attempt.assessment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(Error::QuestionNotFound)?;
        let question = Question::try_from(row)?;

        if let QuestionKind::Mcq { options, .. } = &question.kind {
            let key = value.parse()?;
            if !options.contains(key) {
                return Err(Error::InvalidAnswer(format!(
                    "'{}' is not an option of this question",
                    value
                )));
            }
        }

        let answer_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO answers (attempt_id, question_id, answer)
            VALUES ($1, $2, $3)
            ON CONFLICT (attempt_id, question_id)
            DO UPDATE SET answer = EXCLUDED.answer, updated_at = NOW()
            RETURNING id
            "#,
        )
        .bind(attempt_id)
        .bind(question_id)
        .bind(value)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(answer_id)
    }

    /// Submits the attempt, auto-grades its MCQ answers and returns the score.
    /// The pass/fail verdict is withheld until publication.
    pub async fn submit_attempt(&self, attempt_id: Uuid, candidate_id: Uuid) -> Result<Decimal> {
        let mut tx = self.pool.begin().await?;

        let status: String = sqlx::query_scalar(
            r#"SELECT status FROM attempts WHERE id = $1 AND candidate_id = $2 FOR UPDATE"#,
        )
        .bind(attempt_id)
        .bind(candidate_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(Error::AttemptNotFound)?;

        if status.parse::<AttemptStatus>()? == AttemptStatus::Submitted {
            tracing::warn!(%attempt_id, "Rejected repeated submit");
            return Err(Error::AlreadySubmitted);
        }

        let score = submit_in(&mut tx, attempt_id).await?;
        tx.commit().await?;

        tracing::info!(%attempt_id, %candidate_id, %score, "Attempt submitted");
        Ok(score)
    }

    /// Questions of an attempt for its owner, in the same redacted shape as start.
    pub async fn attempt_questions(
        &self,
        attempt_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<AttemptPaper> {
        let attempt = sqlx::query_as::<_, ActiveAttemptRow>(
            r#"
            SELECT at.assessment_id, at.status, at.start_time, a.duration_minutes
            FROM attempts at
            JOIN assessments a ON a.id = at.assessment_id
            WHERE at.id = $1 AND at.candidate_id = $2
            "#,
        )
        .bind(attempt_id)
        .bind(candidate_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::AttemptNotFound)?;

        let mut conn = self.pool.acquire().await?;
        let questions = load_questions(&mut conn, attempt.assessment_id).await?;

        Ok(AttemptPaper {
            attempt_id,
            status: attempt.status.parse()?,
            duration_minutes: attempt.duration_minutes,
            start_time: attempt.start_time,
            deadline: attempt_deadline(
                attempt.start_time,
                attempt.duration_minutes,
                self.grace_seconds,
            ),
            questions: questions.iter().map(Question::public_view).collect(),
        })
    }

    /// Submits every in-progress attempt whose deadline has passed. Rows locked by a
    /// concurrent request are skipped and picked up on a later sweep.
    pub async fn expire_overdue_attempts(&self) -> Result<u64> {
        let overdue: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT at.id
            FROM attempts at
            JOIN assessments a ON a.id = at.assessment_id
            WHERE at.status = 'IN_PROGRESS'
              AND at.start_time + make_interval(mins => a.duration_minutes, secs => $1) < NOW()
            "#,
        )
        .bind(self.grace_seconds as f64)
        .fetch_all(&self.pool)
        .await?;

        let mut expired = 0;
        for attempt_id in overdue {
            let mut tx = self.pool.begin().await?;
            let locked: Option<Uuid> = sqlx::query_scalar(
                r#"
                SELECT id FROM attempts
                WHERE id = $1 AND status = 'IN_PROGRESS'
                FOR UPDATE SKIP LOCKED
                "#,
            )
            .bind(attempt_id)
            .fetch_optional(&mut *tx)
            .await?;
            if locked.is_none() {
                continue;
            }

            let score = submit_in(&mut tx, attempt_id).await?;
            tx.commit().await?;
            tracing::info!(%attempt_id, %score, "Overdue attempt submitted automatically");
            expired += 1;
        }

        Ok(expired)
    }

    pub async fn list_attempts(&self, assessment_id: Uuid) -> Result<Vec<AttemptListItem>> {
        let items = sqlx::query_as::<_, AttemptListItem>(
            r#"
            SELECT at.id, at.candidate_id, u.email AS candidate_email, u.full_name AS candidate_name,
                   at.status, at.start_time, at.end_time, at.final_score, at.result, at.is_published
            FROM attempts at
            JOIN users u ON u.id = at.candidate_id
            WHERE at.assessment_id = $1
            ORDER BY at.start_time DESC
            "#,
        )
        .bind(assessment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn attempt_summary(&self, attempt_id: Uuid) -> Result<AttemptSummary> {
        sqlx::query_as::<_, AttemptSummary>(
            r#"
            SELECT at.id, at.assessment_id, a.title AS assessment_title,
                   at.candidate_id, u.email AS candidate_email, u.full_name AS candidate_name,
                   at.status, at.start_time, at.end_time, at.final_score, at.result, at.is_published,
                   (SELECT COUNT(*) FROM violations v WHERE v.attempt_id = at.id) AS violation_count
            FROM attempts at
            JOIN assessments a ON a.id = at.assessment_id
            JOIN users u ON u.id = at.candidate_id
            WHERE at.id = $1
            "#,
        )
        .bind(attempt_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::AttemptNotFound)
    }

    pub async fn attempt_details(&self, attempt_id: Uuid) -> Result<AttemptDetails> {
        let attempt = sqlx::query_as::<_, Attempt>(r#"SELECT * FROM attempts WHERE id = $1"#)
            .bind(attempt_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(Error::AttemptNotFound)?;

        let (assessment_title, total_marks): (String, Decimal) =
            sqlx::query_as(r#"SELECT title, total_marks FROM assessments WHERE id = $1"#)
                .bind(attempt.assessment_id)
                .fetch_one(&self.pool)
                .await?;

        let answers = sqlx::query_as::<_, AnswerDetail>(
            r#"
            SELECT an.id AS answer_id, q.id AS question_id, q.question_text, q.question_type,
                   q.correct_answer, an.answer, an.marks_obtained, q.marks AS max_marks, an.is_graded
            FROM answers an
            JOIN questions q ON q.id = an.question_id
            WHERE an.attempt_id = $1
            ORDER BY q.created_at, q.id
            "#,
        )
        .bind(attempt_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(AttemptDetails {
            attempt,
            assessment_title,
            total_marks,
            answers,
        })
    }

    pub async fn descriptive_answers(&self, attempt_id: Uuid) -> Result<Vec<DescriptiveAnswer>> {
        let exists: Option<Uuid> = sqlx::query_scalar(r#"SELECT id FROM attempts WHERE id = $1"#)
            .bind(attempt_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(Error::AttemptNotFound);
        }

        let answers = sqlx::query_as::<_, DescriptiveAnswer>(
            r#"
            SELECT an.id AS answer_id, q.id AS question_id, q.question_text, an.answer,
                   an.marks_obtained, q.marks AS max_marks, an.is_graded
            FROM answers an
            JOIN questions q ON q.id = an.question_id
            WHERE an.attempt_id = $1 AND q.question_type = 'DESCRIPTIVE'
            ORDER BY q.created_at, q.id
            "#,
        )
        .bind(attempt_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(answers)
    }
}

async fn find_active_attempt(
    conn: &mut PgConnection,
    candidate_id: Uuid,
    assessment_id: Uuid,
) -> Result<Option<Uuid>> {
    let id = sqlx::query_scalar(
        r#"
        SELECT id FROM attempts
        WHERE candidate_id = $1 AND assessment_id = $2 AND status = 'IN_PROGRESS'
        "#,
    )
    .bind(candidate_id)
    .bind(assessment_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(id)
}

pub(crate) async fn load_questions(
    conn: &mut PgConnection,
    assessment_id: Uuid,
) -> Result<Vec<Question>> {
    let rows = sqlx::query_as::<_, QuestionRow>(
        r#"SELECT * FROM questions WHERE assessment_id = $1 ORDER BY created_at, id"#,
    )
    .bind(assessment_id)
    .fetch_all(&mut *conn)
    .await?;
    rows.into_iter().map(Question::try_from).collect()
}

/// Moves a locked IN_PROGRESS attempt to SUBMITTED, grades its MCQ answers,
/// persists the score and finalizes it when nothing is left to grade by hand.
pub(crate) async fn submit_in(conn: &mut PgConnection, attempt_id: Uuid) -> Result<Decimal> {
    let updated = sqlx::query(
        r#"
        UPDATE attempts
        SET status = 'SUBMITTED', end_time = NOW(), is_published = FALSE
        WHERE id = $1 AND status = 'IN_PROGRESS'
        "#,
    )
    .bind(attempt_id)
    .execute(&mut *conn)
    .await?;
    if updated.rows_affected() == 0 {
        return Err(Error::AlreadySubmitted);
    }

    auto_grade_mcqs_in(conn, attempt_id).await?;
    let score = calculate_final_score_in(conn, attempt_id).await?;
    finalize_in(conn, attempt_id).await?;
    Ok(score)
}
