use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

/// A worker's bid on a project.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub project_id: Uuid,
    pub applicant_id: Uuid,
    pub proposal: String,
    pub bid_amount: Decimal,
    pub status: ApplicationStatus,
    pub finishing_link: Option<String>,
    pub finishing_submitted_at: Option<DateTime<Utc>>,
    pub finished_by_applicant: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSummary {
    pub id: Uuid,
    pub project_id: Uuid,
    pub applicant_id: Uuid,
    pub status: ApplicationStatus,
}

impl From<&Application> for ApplicationSummary {
    fn from(app: &Application) -> Self {
        Self {
            id: app.id,
            project_id: app.project_id,
            applicant_id: app.applicant_id,
            status: app.status,
        }
    }
}
