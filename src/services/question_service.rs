use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::dto::admin_dto::QuestionPayload;
use crate::error::{Error, Result};
use crate::models::question::{AdminQuestion, McqOptions, NewQuestion, QuestionKind, QuestionType};

use super::attempt_service::load_questions;

/// Validates an administrator's question payload into a typed question.
/// MCQ options get keys `a`, `b`, ... and the correct answer is stored as a key.
pub fn parse_question_payload(payload: &QuestionPayload) -> Result<NewQuestion> {
    let text = payload.question_text.trim();
    if text.is_empty() {
        return Err(Error::InvalidQuestion("question text is empty".to_string()));
    }
    if payload.marks <= Decimal::ZERO {
        return Err(Error::InvalidQuestion("marks must be positive".to_string()));
    }

    let kind = match payload.question_type.parse::<QuestionType>()? {
        QuestionType::Descriptive => QuestionKind::Descriptive,
        QuestionType::Mcq => {
            let texts = payload
                .options
                .as_deref()
                .ok_or_else(|| Error::InvalidQuestion("MCQ options are missing".to_string()))?;
            let options = McqOptions::from_texts(texts)?;
            let correct = payload
                .correct_answer
                .as_deref()
                .ok_or_else(|| Error::InvalidQuestion("MCQ correct answer is missing".to_string()))?;
            let correct_answer = options.key_for_text(correct).ok_or_else(|| {
                Error::InvalidQuestion(format!("correct answer '{}' is not one of the options", correct))
            })?;
            QuestionKind::Mcq {
                options,
                correct_answer,
            }
        }
    };

    Ok(NewQuestion {
        text: text.to_string(),
        marks: payload.marks,
        kind,
    })
}

#[derive(Clone)]
pub struct QuestionService {
    pool: PgPool,
}

impl QuestionService {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    /// Inserts one question and recomputes the assessment's total marks atomically.
    /// Returns the new question id and the new total.
    pub async fn add_question(
        &self,
        assessment_id: Uuid,
        payload: &QuestionPayload,
    ) -> Result<(Uuid, Decimal)> {
        let question = parse_question_payload(payload)?;

        let mut tx = self.pool.begin().await?;
        lock_assessment(&mut tx, assessment_id).await?;
        let question_id = insert_question_in(&mut tx, assessment_id, &question).await?;
        let total = recompute_total_marks_in(&mut tx, assessment_id).await?;
        tx.commit().await?;

        tracing::info!(%assessment_id, %question_id, %total, "Question added");
        Ok((question_id, total))
    }

    /// All-or-nothing: every payload is validated before anything is written.
    pub async fn bulk_add_questions(
        &self,
        assessment_id: Uuid,
        payloads: &[QuestionPayload],
    ) -> Result<(usize, Decimal)> {
        if payloads.is_empty() {
            return Err(Error::BadRequest("no questions supplied".to_string()));
        }
        let questions = payloads
            .iter()
            .enumerate()
            .map(|(idx, p)| {
                parse_question_payload(p).map_err(|e| match e {
                    Error::InvalidQuestion(msg) => {
                        Error::InvalidQuestion(format!("question #{}: {}", idx + 1, msg))
                    }
                    other => other,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut tx = self.pool.begin().await?;
        lock_assessment(&mut tx, assessment_id).await?;
        for question in &questions {
            insert_question_in(&mut tx, assessment_id, question).await?;
        }
        let total = recompute_total_marks_in(&mut tx, assessment_id).await?;
        tx.commit().await?;

        tracing::info!(%assessment_id, inserted = questions.len(), %total, "Questions bulk added");
        Ok((questions.len(), total))
    }

    pub async fn list_questions(&self, assessment_id: Uuid) -> Result<Vec<AdminQuestion>> {
        let mut conn = self.pool.acquire().await?;
        let exists: Option<Uuid> =
            sqlx::query_scalar(r#"SELECT id FROM assessments WHERE id = $1"#)
                .bind(assessment_id)
                .fetch_optional(&mut *conn)
                .await?;
        if exists.is_none() {
            return Err(Error::AssessmentNotFound);
        }
        let questions = load_questions(&mut conn, assessment_id).await?;
        Ok(questions.iter().map(|q| q.admin_view()).collect())
    }

    pub async fn delete_question(&self, assessment_id: Uuid, question_id: Uuid) -> Result<Decimal> {
        let mut tx = self.pool.begin().await?;
        lock_assessment(&mut tx, assessment_id).await?;

        let deleted = sqlx::query(r#"DELETE FROM questions WHERE id = $1 AND assessment_id = $2"#)
            .bind(question_id)
            .bind(assessment_id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(Error::QuestionNotFound);
        }

        let total = recompute_total_marks_in(&mut tx, assessment_id).await?;
        tx.commit().await?;

        tracing::info!(%assessment_id, %question_id, %total, "Question deleted");
        Ok(total)
    }
}

/// Serializes question mutations per assessment so each recomputation sees
/// the questions written before it.
async fn lock_assessment(conn: &mut PgConnection, assessment_id: Uuid) -> Result<()> {
    sqlx::query_scalar::<_, Uuid>(r#"SELECT id FROM assessments WHERE id = $1 FOR UPDATE"#)
        .bind(assessment_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(Error::AssessmentNotFound)?;
    Ok(())
}

async fn insert_question_in(
    conn: &mut PgConnection,
    assessment_id: Uuid,
    question: &NewQuestion,
) -> Result<Uuid> {
    let id = sqlx::query_scalar(
        r#"
        INSERT INTO questions (assessment_id, question_text, question_type, marks, options, correct_answer)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(assessment_id)
    .bind(&question.text)
    .bind(question.kind.question_type().as_str())
    .bind(question.marks)
    .bind(question.options_json())
    .bind(question.correct_answer())
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

pub(crate) async fn recompute_total_marks_in(
    conn: &mut PgConnection,
    assessment_id: Uuid,
) -> Result<Decimal> {
    let total: Decimal = sqlx::query_scalar(
        r#"
        UPDATE assessments
        SET total_marks = (SELECT COALESCE(SUM(marks), 0) FROM questions WHERE assessment_id = $1)
        WHERE id = $1
        RETURNING total_marks
        "#,
    )
    .bind(assessment_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(total)
}
