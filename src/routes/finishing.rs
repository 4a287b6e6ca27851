use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::models::Project;
use crate::state::SharedState;
use crate::workflow::finishing::{self, FinishingStatus};

#[derive(Deserialize)]
pub struct FinishingRequest {
    pub finishing_link: String,
}

pub async fn submit(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<FinishingRequest>,
) -> Result<Json<Project>, AppError> {
    let project = finishing::submit_finishing(&state, id, auth.user_id, &req.finishing_link).await?;
    Ok(Json(project))
}

pub async fn confirm(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, AppError> {
    Ok(Json(finishing::confirm_finishing(&state, id, auth.user_id).await?))
}

pub async fn status(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FinishingStatus>, AppError> {
    Ok(Json(finishing::get_status(&state.pool, id, auth.user_id).await?))
}
