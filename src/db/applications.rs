use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Application;

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    project_id: Uuid,
    applicant_id: Uuid,
    proposal: &str,
    bid_amount: Decimal,
) -> Result<Application, sqlx::Error> {
    sqlx::query_as::<_, Application>(
        "INSERT INTO applications (project_id, applicant_id, proposal, bid_amount)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(project_id)
    .bind(applicant_id)
    .bind(proposal)
    .bind(bid_amount)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<Application>, sqlx::Error> {
    sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn find_by_project_and_applicant<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    project_id: Uuid,
    applicant_id: Uuid,
) -> Result<Option<Application>, sqlx::Error> {
    sqlx::query_as::<_, Application>(
        "SELECT * FROM applications WHERE project_id = $1 AND applicant_id = $2",
    )
    .bind(project_id)
    .bind(applicant_id)
    .fetch_optional(executor)
    .await
}

/// The accepted bid on a project, if any.
pub async fn find_approved<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    project_id: Uuid,
) -> Result<Option<Application>, sqlx::Error> {
    sqlx::query_as::<_, Application>(
        "SELECT * FROM applications WHERE project_id = $1 AND status = 'approved'",
    )
    .bind(project_id)
    .fetch_optional(executor)
    .await
}

pub async fn list_by_project(
    pool: &PgPool,
    project_id: Uuid,
) -> Result<Vec<Application>, sqlx::Error> {
    sqlx::query_as::<_, Application>(
        "SELECT * FROM applications WHERE project_id = $1 ORDER BY created_at ASC",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

pub async fn list_by_applicant(
    pool: &PgPool,
    applicant_id: Uuid,
) -> Result<Vec<Application>, sqlx::Error> {
    sqlx::query_as::<_, Application>(
        "SELECT * FROM applications WHERE applicant_id = $1 ORDER BY created_at DESC",
    )
    .bind(applicant_id)
    .fetch_all(pool)
    .await
}

/// PENDING -> APPROVED. Fails with a unique violation if another bid on the
/// same project is already approved.
pub async fn approve<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<Application>, sqlx::Error> {
    sqlx::query_as::<_, Application>(
        "UPDATE applications SET status = 'approved'
         WHERE id = $1 AND status = 'pending' RETURNING *",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// PENDING -> REJECTED
pub async fn reject<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<Application>, sqlx::Error> {
    sqlx::query_as::<_, Application>(
        "UPDATE applications SET status = 'rejected'
         WHERE id = $1 AND status = 'pending' RETURNING *",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn record_finishing<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    finishing_link: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE applications SET finishing_link = $2, finishing_submitted_at = now()
         WHERE id = $1",
    )
    .bind(id)
    .bind(finishing_link)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn clear_finishing<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE applications SET finishing_link = NULL, finishing_submitted_at = NULL
         WHERE id = $1",
    )
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn mark_finished_by_applicant<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE applications SET finished_by_applicant = true WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
