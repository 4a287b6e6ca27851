use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Activity;

pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    activity_type: &str,
    description: &str,
    related_entity_type: Option<&str>,
    related_entity_id: Option<Uuid>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO activities (user_id, activity_type, description, related_entity_type, related_entity_id)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(user_id)
    .bind(activity_type)
    .bind(description)
    .bind(related_entity_type)
    .bind(related_entity_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_by_user(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Activity>, sqlx::Error> {
    sqlx::query_as::<_, Activity>(
        "SELECT * FROM activities WHERE user_id = $1
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}
