use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Violation {
    pub id: Uuid,
    pub attempt_id: Uuid,
    pub violation_type: String,
    pub created_at: DateTime<Utc>,
}
