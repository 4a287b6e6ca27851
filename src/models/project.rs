use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a posted project.
///
/// ```text
/// OPEN ──accept──▶ ONGOING ──finish/submit──▶ DONE ──confirm──▶ CLOSED
///   │                 ▲  │                      │
///   │                 │  └──────sweep──┐        │
///   └──────sweep──────┼───────────────▶ OVERDUE │
///                     └────reject verdict───────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum ProjectStatus {
    Open,
    Ongoing,
    Done,
    Closed,
    Overdue,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 5] = [
        ProjectStatus::Open,
        ProjectStatus::Ongoing,
        ProjectStatus::Done,
        ProjectStatus::Closed,
        ProjectStatus::Overdue,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Open => "OPEN",
            ProjectStatus::Ongoing => "ONGOING",
            ProjectStatus::Done => "DONE",
            ProjectStatus::Closed => "CLOSED",
            ProjectStatus::Overdue => "OVERDUE",
        }
    }

    /// Every status change in the system must be listed here.
    pub fn can_transition_to(self, next: ProjectStatus) -> bool {
        use ProjectStatus::*;
        matches!(
            (self, next),
            (Open, Ongoing)
                | (Open, Overdue)
                | (Ongoing, Done)
                | (Ongoing, Overdue)
                | (Done, Closed)
                | (Done, Ongoing)
        )
    }

    /// Still eligible for the deadline sweep.
    pub fn is_unfinished(self) -> bool {
        matches!(self, ProjectStatus::Open | ProjectStatus::Ongoing)
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub budget: Decimal,
    pub deadline: Option<NaiveDate>,
    pub status: ProjectStatus,
    pub applicant_count: i32,
    pub brief: Option<String>,
    pub brief_attachment: Option<String>,
    pub finishing_link: Option<String>,
    pub finishing_submitted_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub finishing_confirmed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a client supplies when posting a project.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub budget: Decimal,
    pub deadline: Option<NaiveDate>,
    pub brief: Option<String>,
}

impl Project {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    /// Strip the brief unless the viewer is allowed to see it.
    pub fn redacted_for(mut self, can_see_brief: bool) -> Self {
        if !can_see_brief {
            self.brief = None;
            self.brief_attachment = None;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::ProjectStatus::{self, *};

    #[test]
    fn forward_path_is_allowed() {
        assert!(Open.can_transition_to(Ongoing));
        assert!(Ongoing.can_transition_to(Done));
        assert!(Done.can_transition_to(Closed));
    }

    #[test]
    fn rejected_work_rewinds_to_ongoing() {
        assert!(Done.can_transition_to(Ongoing));
        assert!(!Closed.can_transition_to(Ongoing));
    }

    #[test]
    fn only_unfinished_projects_go_overdue() {
        for status in ProjectStatus::ALL {
            assert_eq!(
                status.can_transition_to(Overdue),
                status.is_unfinished(),
                "{status}"
            );
        }
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for from in [Closed, Overdue] {
            for to in ProjectStatus::ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn skipping_states_is_not_allowed() {
        assert!(!Open.can_transition_to(Done));
        assert!(!Open.can_transition_to(Closed));
        assert!(!Ongoing.can_transition_to(Closed));
    }

    #[test]
    fn serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Ongoing).unwrap(), "\"ONGOING\"");
        let parsed: ProjectStatus = serde_json::from_str("\"OVERDUE\"").unwrap();
        assert_eq!(parsed, Overdue);
    }
}
