use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::models::{Contract, NewProject, Project, ProjectStatus};
use crate::state::SharedState;
use crate::sweeper;
use crate::upload;
use crate::workflow::registry;

#[derive(Deserialize)]
pub struct ListQuery {
    pub owner: Option<Uuid>,
    pub status: Option<ProjectStatus>,
}

#[derive(Deserialize)]
pub struct BriefRequest {
    pub brief: Option<String>,
}

#[derive(Serialize)]
pub struct DeadlineResponse {
    pub project_id: Uuid,
    pub is_overdue: bool,
    pub days_until_deadline: i64,
}

/// `?owner=` lists one client's projects, `?status=` filters the board.
/// With neither, the open board is returned.
pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Project>>, AppError> {
    let projects = match (query.owner, query.status) {
        (Some(owner), status) => registry::list_by_owner(&state.pool, owner)
            .await?
            .into_iter()
            .filter(|p| status.is_none_or(|s| p.status == s))
            .collect(),
        (None, status) => {
            registry::list_by_status(&state.pool, status.unwrap_or(ProjectStatus::Open)).await?
        }
    };

    let projects = projects
        .into_iter()
        .map(|p| {
            let owned = p.is_owned_by(auth.user_id);
            p.redacted_for(owned)
        })
        .collect();
    Ok(Json(projects))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<NewProject>,
) -> Result<(StatusCode, Json<Project>), AppError> {
    let project = registry::create(&state, auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, AppError> {
    let project = registry::get_visible(&state.pool, id, auth.user_id).await?;
    Ok(Json(project))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    registry::delete(&state, id, auth.user_id).await?;
    Ok(Json(json!({ "deleted": true })))
}

/// Accepts multipart (`brief` text plus an optional `attachment` file) or a
/// JSON body with just `brief`.
pub async fn update_brief(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Project>, AppError> {
    let (brief, attachment) = if upload::is_multipart(&headers) {
        let mut form = upload::parse_multipart(&headers, body)
            .await
            .map_err(AppError::Validation)?;
        let brief = form.text("brief").map(str::to_string);
        let attachment = form.take_files().into_iter().next();
        (brief, attachment)
    } else {
        let req: BriefRequest = serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("Invalid JSON: {e}")))?;
        (req.brief, None)
    };

    let project = registry::update_brief(&state, id, auth.user_id, brief, attachment).await?;
    Ok(Json(project))
}

pub async fn deadline(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeadlineResponse>, AppError> {
    Ok(Json(DeadlineResponse {
        project_id: id,
        is_overdue: sweeper::is_overdue(&state.pool, id).await?,
        days_until_deadline: sweeper::days_until_deadline(&state.pool, id).await?,
    }))
}

pub async fn contract(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Contract>, AppError> {
    Ok(Json(registry::get_contract(&state.pool, id, auth.user_id).await?))
}
