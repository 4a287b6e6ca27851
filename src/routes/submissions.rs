use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::models::work_submission::Verdict;
use crate::models::WorkSubmission;
use crate::state::SharedState;
use crate::upload;
use crate::workflow::require_participant;
use crate::workflow::review::{self, SubmissionInput};

#[derive(Deserialize)]
pub struct JsonSubmission {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub links: Vec<String>,
}

#[derive(Deserialize)]
pub struct ReviewRequest {
    pub status: Verdict,
    pub feedback: Option<String>,
}

/// Multipart with `description`, repeated or comma-joined `links`, and any
/// number of file parts. A JSON body is accepted for link-only deliverables.
pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(project_id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WorkSubmission>, AppError> {
    let input = if upload::is_multipart(&headers) {
        let mut form = upload::parse_multipart(&headers, body)
            .await
            .map_err(AppError::Validation)?;
        SubmissionInput {
            description: form.text("description").unwrap_or_default().to_string(),
            links: form.all("links").to_vec(),
            files: form.take_files(),
        }
    } else {
        let req: JsonSubmission = serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("Invalid JSON: {e}")))?;
        SubmissionInput {
            description: req.description,
            links: req.links,
            files: Vec::new(),
        }
    };

    let submission = review::create_submission(&state, project_id, auth.user_id, input).await?;
    Ok(Json(submission))
}

pub async fn review(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<WorkSubmission>, AppError> {
    let reviewed = review::review(&state, id, auth.user_id, req.status, req.feedback).await?;
    Ok(Json(reviewed))
}

pub async fn list_by_project(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<WorkSubmission>>, AppError> {
    require_participant(&state.pool, project_id, auth.user_id).await?;
    Ok(Json(review::list_by_project(&state.pool, project_id).await?))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkSubmission>, AppError> {
    let submission = review::get_by_id(&state.pool, id).await?;
    require_participant(&state.pool, submission.project_id, auth.user_id).await?;
    Ok(Json(submission))
}

pub async fn mine(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<WorkSubmission>>, AppError> {
    Ok(Json(review::list_by_user(&state.pool, auth.user_id).await?))
}
