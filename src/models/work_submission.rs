use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Review states for a deliverable. Stored as plain text, independent of
/// the project and application status enums.
pub mod status {
    pub const PENDING: &str = "PENDING";
    pub const APPROVED: &str = "APPROVED";
    pub const REJECTED: &str = "REJECTED";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Approved,
    Rejected,
}

impl Verdict {
    pub fn as_status(self) -> &'static str {
        match self {
            Verdict::Approved => status::APPROVED,
            Verdict::Rejected => status::REJECTED,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct WorkSubmission {
    pub id: Uuid,
    pub project_id: Uuid,
    pub submitter_id: Uuid,
    pub description: String,
    /// Comma-joined external links.
    pub links: String,
    pub files: Vec<String>,
    pub status: String,
    pub feedback: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl WorkSubmission {
    pub fn is_pending(&self) -> bool {
        self.status == status::PENDING
    }
}

pub fn split_links(joined: &str) -> Vec<&str> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Normalize links that may arrive as separate values or already comma-joined.
pub fn join_links<S: AsRef<str>>(links: &[S]) -> String {
    links
        .iter()
        .flat_map(|l| split_links(l.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}
