use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Contract;

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    project_id: Uuid,
    applicant_id: Uuid,
    owner_id: Uuid,
    body: &str,
) -> Result<Contract, sqlx::Error> {
    sqlx::query_as::<_, Contract>(
        "INSERT INTO contracts (project_id, applicant_id, owner_id, body)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(project_id)
    .bind(applicant_id)
    .bind(owner_id)
    .bind(body)
    .fetch_one(executor)
    .await
}

pub async fn find_by_project(
    pool: &PgPool,
    project_id: Uuid,
) -> Result<Option<Contract>, sqlx::Error> {
    sqlx::query_as::<_, Contract>("SELECT * FROM contracts WHERE project_id = $1")
        .bind(project_id)
        .fetch_optional(pool)
        .await
}
