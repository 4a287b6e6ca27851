use sqlx::PgPool;
use uuid::Uuid;

use crate::models::work_submission::status;
use crate::models::WorkSubmission;

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    project_id: Uuid,
    submitter_id: Uuid,
    description: &str,
    links: &str,
    files: &[String],
) -> Result<WorkSubmission, sqlx::Error> {
    sqlx::query_as::<_, WorkSubmission>(
        "INSERT INTO work_submissions (project_id, submitter_id, description, links, files)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(project_id)
    .bind(submitter_id)
    .bind(description)
    .bind(links)
    .bind(files)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<WorkSubmission>, sqlx::Error> {
    sqlx::query_as::<_, WorkSubmission>("SELECT * FROM work_submissions WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// The most recently created submission on a project that has not been reviewed.
pub async fn latest_pending<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    project_id: Uuid,
) -> Result<Option<WorkSubmission>, sqlx::Error> {
    sqlx::query_as::<_, WorkSubmission>(
        "SELECT * FROM work_submissions
         WHERE project_id = $1 AND status = $2
         ORDER BY submitted_at DESC, id DESC
         LIMIT 1",
    )
    .bind(project_id)
    .bind(status::PENDING)
    .fetch_optional(executor)
    .await
}

/// Whether the owner has approved any deliverable on the project.
pub async fn has_approved<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    project_id: Uuid,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM work_submissions WHERE project_id = $1 AND status = $2)",
    )
    .bind(project_id)
    .bind(status::APPROVED)
    .fetch_one(executor)
    .await
}

/// Store the owner's verdict. Only applies to a submission still pending.
pub async fn record_verdict<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    verdict_status: &str,
    feedback: Option<&str>,
) -> Result<Option<WorkSubmission>, sqlx::Error> {
    sqlx::query_as::<_, WorkSubmission>(
        "UPDATE work_submissions SET status = $2, feedback = $3, reviewed_at = now()
         WHERE id = $1 AND status = $4 RETURNING *",
    )
    .bind(id)
    .bind(verdict_status)
    .bind(feedback)
    .bind(status::PENDING)
    .fetch_optional(executor)
    .await
}

pub async fn list_by_project(
    pool: &PgPool,
    project_id: Uuid,
) -> Result<Vec<WorkSubmission>, sqlx::Error> {
    sqlx::query_as::<_, WorkSubmission>(
        "SELECT * FROM work_submissions WHERE project_id = $1
         ORDER BY submitted_at DESC, id DESC",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

pub async fn list_by_user(
    pool: &PgPool,
    submitter_id: Uuid,
) -> Result<Vec<WorkSubmission>, sqlx::Error> {
    sqlx::query_as::<_, WorkSubmission>(
        "SELECT * FROM work_submissions WHERE submitter_id = $1
         ORDER BY submitted_at DESC, id DESC",
    )
    .bind(submitter_id)
    .fetch_all(pool)
    .await
}
