use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::models::{Application, ApplicationSummary};
use crate::state::SharedState;
use crate::workflow::{applications, registry, require_owner};

#[derive(Deserialize)]
pub struct ApplyRequest {
    pub proposal: String,
    pub bid_amount: Decimal,
}

pub async fn apply(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<ApplicationSummary>), AppError> {
    let summary =
        applications::apply(&state, project_id, auth.user_id, &req.proposal, req.bid_amount)
            .await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// Bids on one project, for its owner.
pub async fn list_by_project(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Application>>, AppError> {
    let project = registry::get_by_id(&state.pool, project_id).await?;
    require_owner(&project, auth.user_id)?;
    Ok(Json(applications::list_by_project(&state.pool, project_id).await?))
}

pub async fn mine(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Application>>, AppError> {
    Ok(Json(applications::list_by_applicant(&state.pool, auth.user_id).await?))
}

pub async fn accept(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Application>, AppError> {
    Ok(Json(applications::accept(&state, id, auth.user_id).await?))
}

pub async fn reject(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Application>, AppError> {
    Ok(Json(applications::reject(&state, id, auth.user_id).await?))
}
