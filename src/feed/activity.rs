use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityType {
    ProjectPosted,
    ProjectDeleted,
    ApplicationSubmitted,
    ApplicationAccepted,
    FinishingSubmitted,
    WorkSubmitted,
    WorkRejected,
    WorkAccepted,
    ProjectCompleted,
    ProjectOverdue,
}

impl ActivityType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::ProjectPosted => "project_posted",
            ActivityType::ProjectDeleted => "project_deleted",
            ActivityType::ApplicationSubmitted => "application_submitted",
            ActivityType::ApplicationAccepted => "application_accepted",
            ActivityType::FinishingSubmitted => "finishing_submitted",
            ActivityType::WorkSubmitted => "work_submitted",
            ActivityType::WorkRejected => "work_rejected",
            ActivityType::WorkAccepted => "work_accepted",
            ActivityType::ProjectCompleted => "project_completed",
            ActivityType::ProjectOverdue => "project_overdue",
        }
    }
}

/// Record an activity. Called after the owning transaction has committed;
/// failures are logged and dropped.
pub async fn record(
    pool: &PgPool,
    user_id: Uuid,
    activity_type: ActivityType,
    description: &str,
    related_entity_type: Option<&str>,
    related_entity_id: Option<Uuid>,
) {
    if let Err(e) = crate::db::activities::create(
        pool,
        user_id,
        activity_type.as_str(),
        description,
        related_entity_type,
        related_entity_id,
    )
    .await
    {
        tracing::error!(
            "Failed to record {} activity for user {user_id}: {e}",
            activity_type.as_str()
        );
    }
}

/// Shorthand for activities about a project.
pub async fn record_for_project(
    pool: &PgPool,
    user_id: Uuid,
    activity_type: ActivityType,
    description: &str,
    project_id: Uuid,
) {
    record(
        pool,
        user_id,
        activity_type,
        description,
        Some("project"),
        Some(project_id),
    )
    .await;
}
