use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::role::Capability;
use crate::db;
use crate::error::AppError;
use crate::feed::activity::{self, ActivityType};
use crate::models::{ApplicationStatus, Contract, NewProject, Project, ProjectStatus};
use crate::state::AppState;
use crate::storage::{self, FileRef, UploadedFile};

use super::{project_not_found, require_owner, require_participant, user_not_found};

const MAX_TITLE_CHARS: usize = 200;

pub async fn create(state: &AppState, owner_id: Uuid, spec: NewProject) -> Result<Project, AppError> {
    let owner = user_not_found(db::users::find_by_id(&state.pool, owner_id).await?)?;
    owner.role.require(Capability::PostProjects)?;
    validate(&spec)?;

    let project = db::projects::create(&state.pool, owner_id, &spec).await?;
    tracing::info!("Project {} posted by {owner_id}", project.id);

    activity::record_for_project(
        &state.pool,
        owner_id,
        ActivityType::ProjectPosted,
        &format!("Posted project \"{}\"", project.title),
        project.id,
    )
    .await;

    Ok(project)
}

fn validate(spec: &NewProject) -> Result<(), AppError> {
    if spec.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    if spec.title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::Validation(
            format!("Title must be at most {MAX_TITLE_CHARS} characters"),
        ));
    }
    if spec.budget < Decimal::ZERO {
        return Err(AppError::Validation(
            "Budget must not be negative".to_string(),
        ));
    }
    if spec.deadline.is_none() {
        return Err(AppError::Validation("Deadline is required".to_string()));
    }
    Ok(())
}

/// Delete a project and, through the schema's cascades, its applications,
/// contract and work submissions. No status check.
pub async fn delete(state: &AppState, project_id: Uuid, requester_id: Uuid) -> Result<(), AppError> {
    let mut tx = state.pool.begin().await?;

    let project = db::projects::lock_by_id(&mut *tx, project_id)
        .await?
        .ok_or_else(project_not_found)?;
    require_owner(&project, requester_id)?;

    db::projects::delete(&mut *tx, project_id).await?;
    tx.commit().await?;

    tracing::info!("Project {project_id} deleted by {requester_id}");

    if let Some(attachment) = project.brief_attachment {
        state.files.delete(&FileRef(attachment)).await;
    }

    activity::record(
        &state.pool,
        requester_id,
        ActivityType::ProjectDeleted,
        &format!("Deleted project \"{}\"", project.title),
        Some("project"),
        Some(project_id),
    )
    .await;

    Ok(())
}

pub async fn get_by_id(pool: &PgPool, project_id: Uuid) -> Result<Project, AppError> {
    db::projects::find_by_id(pool, project_id)
        .await?
        .ok_or_else(project_not_found)
}

/// The project as `viewer` may see it: the brief is only shown to the owner
/// and the accepted applicant.
pub async fn get_visible(pool: &PgPool, project_id: Uuid, viewer: Uuid) -> Result<Project, AppError> {
    let project = get_by_id(pool, project_id).await?;
    let can_see_brief = can_see_brief(pool, &project, viewer).await?;
    Ok(project.redacted_for(can_see_brief))
}

async fn can_see_brief(pool: &PgPool, project: &Project, viewer: Uuid) -> Result<bool, AppError> {
    if project.is_owned_by(viewer) {
        return Ok(true);
    }
    let application = db::applications::find_by_project_and_applicant(pool, project.id, viewer).await?;
    Ok(application.is_some_and(|a| a.status == ApplicationStatus::Approved))
}

/// The engagement contract, once a bid has been accepted.
pub async fn get_contract(pool: &PgPool, project_id: Uuid, viewer: Uuid) -> Result<Contract, AppError> {
    require_participant(pool, project_id, viewer).await?;
    db::contracts::find_by_project(pool, project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No contract for this project yet".to_string()))
}

pub async fn list_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Project>, AppError> {
    Ok(db::projects::list_by_owner(pool, owner_id).await?)
}

pub async fn list_by_status(pool: &PgPool, status: ProjectStatus) -> Result<Vec<Project>, AppError> {
    Ok(db::projects::list_by_status(pool, status).await?)
}

/// Replace the brief text and, if given, the brief attachment. The previous
/// attachment is deleted once the new one is committed.
pub async fn update_brief(
    state: &AppState,
    project_id: Uuid,
    owner_id: Uuid,
    brief: Option<String>,
    attachment: Option<UploadedFile>,
) -> Result<Project, AppError> {
    let project = get_by_id(&state.pool, project_id).await?;
    require_owner(&project, owner_id)?;

    let stored = match &attachment {
        Some(file) => Some(state.files.store(file, "briefs").await?),
        None => None,
    };

    let result = async {
        let mut tx = state.pool.begin().await?;
        let current = db::projects::lock_by_id(&mut *tx, project_id)
            .await?
            .ok_or_else(project_not_found)?;
        let attachment_ref = stored
            .as_ref()
            .map(|f| f.as_str().to_string())
            .or(current.brief_attachment.clone());
        let updated = db::projects::update_brief(
            &mut *tx,
            project_id,
            brief.as_deref(),
            attachment_ref.as_deref(),
        )
        .await?;
        tx.commit().await?;
        Ok::<_, AppError>((current, updated))
    }
    .await;

    match result {
        Ok((previous, updated)) => {
            if stored.is_some() {
                if let Some(old) = previous.brief_attachment {
                    state.files.delete(&FileRef(old)).await;
                }
            }
            Ok(updated)
        }
        Err(e) => {
            if let Some(file) = stored {
                storage::discard(state.files.as_ref(), &[file]).await;
            }
            Err(e)
        }
    }
}
