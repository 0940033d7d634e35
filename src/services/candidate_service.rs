use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::admin_dto::{BulkCandidatesResponse, CandidatePayload};
use crate::error::{Error, Result};
use crate::models::user::User;

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Clone)]
pub struct CandidateService {
    pool: PgPool,
}

impl CandidateService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn add_candidate(&self, payload: &CandidatePayload) -> Result<Uuid> {
        payload.validate()?;
        let email = normalize_email(&payload.email);

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO users (email, full_name, role)
            VALUES ($1, $2, 'CANDIDATE')
            RETURNING id
            "#,
        )
        .bind(&email)
        .bind(payload.full_name.as_deref().map(str::trim).unwrap_or_default())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match Error::from(e) {
            Error::Conflict(_) => Error::Conflict(format!("User '{}' already exists", email)),
            other => other,
        })?;

        tracing::info!(candidate_id = %id, "Candidate added");
        Ok(id)
    }

    /// Best-effort bulk insert: malformed or duplicate entries are skipped and
    /// counted. A storage failure rolls the whole batch back.
    pub async fn bulk_add_candidates(
        &self,
        payloads: &[CandidatePayload],
    ) -> Result<BulkCandidatesResponse> {
        let mut tx = self.pool.begin().await?;
        let mut inserted_count = 0u64;
        let mut skipped_count = 0u64;

        for payload in payloads {
            if payload.validate().is_err() {
                skipped_count += 1;
                continue;
            }
            let inserted: Option<Uuid> = sqlx::query_scalar(
                r#"
                INSERT INTO users (email, full_name, role)
                VALUES ($1, $2, 'CANDIDATE')
                ON CONFLICT (email) DO NOTHING
                RETURNING id
                "#,
            )
            .bind(normalize_email(&payload.email))
            .bind(payload.full_name.as_deref().map(str::trim).unwrap_or_default())
            .fetch_optional(&mut *tx)
            .await?;

            match inserted {
                Some(_) => inserted_count += 1,
                None => skipped_count += 1,
            }
        }

        tx.commit().await?;

        tracing::info!(inserted_count, skipped_count, "Candidates bulk added");
        Ok(BulkCandidatesResponse {
            inserted_count,
            skipped_count,
        })
    }

    pub async fn list_candidates(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"SELECT * FROM users WHERE role = 'CANDIDATE' ORDER BY created_at DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }
}
