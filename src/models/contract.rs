use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Binds a project owner to the accepted applicant.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Contract {
    pub id: Uuid,
    pub project_id: Uuid,
    pub applicant_id: Uuid,
    pub owner_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
