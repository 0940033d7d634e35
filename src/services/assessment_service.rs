use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::admin_dto::{CreateAssessmentRequest, UpdateAssessmentRequest};
use crate::error::{Error, Result};
use crate::models::assessment::Assessment;
use crate::utils::code::{generate_assessment_code, normalize_assessment_code};

const DEFAULT_PASS_PERCENTAGE: i64 = 40;

pub fn validate_pass_percentage(value: Decimal) -> Result<Decimal> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(Error::BadRequest(
            "pass_percentage must be between 0 and 100".to_string(),
        ));
    }
    Ok(value)
}

#[derive(Clone)]
pub struct AssessmentService {
    pool: PgPool,
}

impl AssessmentService {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    pub async fn create_assessment(&self, req: &CreateAssessmentRequest) -> Result<Assessment> {
        let pass_percentage = validate_pass_percentage(
            req.pass_percentage
                .unwrap_or_else(|| Decimal::from(DEFAULT_PASS_PERCENTAGE)),
        )?;
        let code = match req.code.as_deref() {
            Some(raw) => normalize_assessment_code(raw)?,
            None => generate_assessment_code(),
        };

        let assessment = sqlx::query_as::<_, Assessment>(
            r#"
            INSERT INTO assessments (title, duration_minutes, pass_percentage, code)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(req.title.trim())
        .bind(req.duration_minutes)
        .bind(pass_percentage)
        .bind(&code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match Error::from(e) {
            Error::Conflict(_) => Error::Conflict(format!("Assessment code '{}' is taken", code)),
            other => other,
        })?;

        tracing::info!(assessment_id = %assessment.id, code = %assessment.code, "Assessment created");
        Ok(assessment)
    }

    /// Partial update. `total_marks` and `code` are never editable here.
    pub async fn update_assessment(
        &self,
        assessment_id: Uuid,
        req: &UpdateAssessmentRequest,
    ) -> Result<Assessment> {
        let pass_percentage = req
            .pass_percentage
            .map(validate_pass_percentage)
            .transpose()?;

        sqlx::query_as::<_, Assessment>(
            r#"
            UPDATE assessments SET
                title = COALESCE($2, title),
                duration_minutes = COALESCE($3, duration_minutes),
                pass_percentage = COALESCE($4, pass_percentage),
                status = COALESCE($5, status)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(assessment_id)
        .bind(req.title.as_deref().map(str::trim))
        .bind(req.duration_minutes)
        .bind(pass_percentage)
        .bind(req.status.map(|s| s.as_str()))
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::AssessmentNotFound)
    }

    pub async fn list_assessments(&self) -> Result<Vec<Assessment>> {
        let items =
            sqlx::query_as::<_, Assessment>(r#"SELECT * FROM assessments ORDER BY created_at DESC"#)
                .fetch_all(&self.pool)
                .await?;
        Ok(items)
    }

    pub async fn get_assessment(&self, assessment_id: Uuid) -> Result<Assessment> {
        sqlx::query_as::<_, Assessment>(r#"SELECT * FROM assessments WHERE id = $1"#)
            .bind(assessment_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(Error::AssessmentNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_percentage_bounds() {
        assert!(validate_pass_percentage(Decimal::ZERO).is_ok());
        assert!(validate_pass_percentage(Decimal::ONE_HUNDRED).is_ok());
        assert!(validate_pass_percentage(Decimal::new(405, 1)).is_ok());
        assert!(validate_pass_percentage(Decimal::new(-1, 0)).is_err());
        assert!(validate_pass_percentage(Decimal::new(1001, 1)).is_err());
    }
}
