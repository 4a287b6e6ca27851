use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::auth::extractor::AuthUser;
use crate::auth::role::Capability;
use crate::error::AppError;
use crate::state::SharedState;
use crate::sweeper;

#[derive(Serialize)]
pub struct SweepResponse {
    pub marked_overdue: usize,
}

/// Run the deadline sweep now instead of waiting for the daily schedule.
pub async fn sweep(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<SweepResponse>, AppError> {
    auth.require(Capability::Administer)?;
    let marked_overdue = sweeper::check_and_mark_overdue_projects(&state).await?;
    tracing::info!("Manual deadline sweep by {}: {marked_overdue} marked", auth.user_id);
    Ok(Json(SweepResponse { marked_overdue }))
}
