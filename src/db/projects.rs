use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{NewProject, Project, ProjectStatus};

// Status-changing statements are conditional on the current status so a
// racing writer that already moved the project gets `None` back.

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    owner_id: Uuid,
    spec: &NewProject,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "INSERT INTO projects (owner_id, title, description, category, budget, deadline, brief)
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(owner_id)
    .bind(spec.title.trim())
    .bind(&spec.description)
    .bind(&spec.category)
    .bind(spec.budget)
    .bind(spec.deadline)
    .bind(spec.brief.as_deref())
    .fetch_one(executor)
    .await
}

pub async fn find_by_id<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Row-lock the project for the rest of the transaction.
pub async fn lock_by_id<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn list_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "SELECT * FROM projects WHERE owner_id = $1 ORDER BY created_at DESC",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await
}

pub async fn list_by_status(
    pool: &PgPool,
    status: ProjectStatus,
) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "SELECT * FROM projects WHERE status = $1 ORDER BY created_at DESC",
    )
    .bind(status)
    .fetch_all(pool)
    .await
}

/// Projects whose deadline is strictly before `today` and which are still open or ongoing.
pub async fn list_overdue_candidates(
    pool: &PgPool,
    today: NaiveDate,
) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "SELECT * FROM projects
         WHERE status IN ('open', 'ongoing')
           AND deadline IS NOT NULL
           AND deadline < $1
         ORDER BY deadline ASC",
    )
    .bind(today)
    .fetch_all(pool)
    .await
}

pub async fn increment_applicant_count<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE projects SET applicant_count = applicant_count + 1, updated_at = now()
         WHERE id = $1",
    )
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn update_brief<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    brief: Option<&str>,
    brief_attachment: Option<&str>,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects SET brief = $2, brief_attachment = $3, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(brief)
    .bind(brief_attachment)
    .fetch_one(executor)
    .await
}

/// OPEN -> ONGOING
pub async fn mark_ongoing<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects SET status = 'ongoing', updated_at = now()
         WHERE id = $1 AND status = 'open' RETURNING *",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// ONGOING -> DONE, stamping the finishing fields.
pub async fn mark_done<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    finishing_link: Option<&str>,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects
         SET status = 'done', finishing_link = $2, finishing_submitted_at = now(), updated_at = now()
         WHERE id = $1 AND status = 'ongoing' RETURNING *",
    )
    .bind(id)
    .bind(finishing_link)
    .fetch_optional(executor)
    .await
}

/// DONE -> CLOSED
pub async fn mark_closed<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    confirmed_by: Uuid,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects
         SET status = 'closed', finished_at = now(), finishing_confirmed_by = $2, updated_at = now()
         WHERE id = $1 AND status = 'done' RETURNING *",
    )
    .bind(id)
    .bind(confirmed_by)
    .fetch_optional(executor)
    .await
}

/// DONE -> ONGOING, clearing the finishing fields so the worker can resubmit.
pub async fn reopen_for_resubmission<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects
         SET status = 'ongoing', finishing_link = NULL, finishing_submitted_at = NULL, updated_at = now()
         WHERE id = $1 AND status = 'done' RETURNING *",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// OPEN/ONGOING -> OVERDUE when the deadline is strictly before `today`.
pub async fn mark_overdue<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    today: NaiveDate,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects SET status = 'overdue', updated_at = now()
         WHERE id = $1
           AND status IN ('open', 'ongoing')
           AND deadline IS NOT NULL
           AND deadline < $2
         RETURNING *",
    )
    .bind(id)
    .bind(today)
    .fetch_optional(executor)
    .await
}

pub async fn delete<'e, E: sqlx::PgExecutor<'e>>(executor: E, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
