use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::db;
use crate::error::AppError;
use crate::feed::activity::{self, ActivityType};
use crate::feed::notifier::{self, kind};
use crate::models::{Application, ApplicationStatus, Project, ProjectStatus};
use crate::state::AppState;

use super::{project_not_found, require_owner, validate_link};

/// Finishing state of a project as seen by one participant.
#[derive(Debug, Clone, Serialize)]
pub struct FinishingStatus {
    pub project_id: Uuid,
    pub status: ProjectStatus,
    pub finishing_link: Option<String>,
    pub finishing_submitted_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub finishing_confirmed_by: Option<Uuid>,
    /// Only present when the caller is the accepted applicant.
    pub application: Option<ApplicationFinishing>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationFinishing {
    pub application_id: Uuid,
    pub finishing_link: Option<String>,
    pub finishing_submitted_at: Option<DateTime<Utc>>,
    pub finished_by_applicant: bool,
}

/// The accepted worker declares the work done by handing over a link.
pub async fn submit_finishing(
    state: &AppState,
    project_id: Uuid,
    worker_id: Uuid,
    finishing_link: &str,
) -> Result<Project, AppError> {
    let mut tx = state.pool.begin().await?;

    let project = db::projects::lock_by_id(&mut *tx, project_id)
        .await?
        .ok_or_else(project_not_found)?;

    let application = db::applications::find_by_project_and_applicant(&mut *tx, project_id, worker_id)
        .await?
        .filter(|a| a.status == ApplicationStatus::Approved)
        .ok_or_else(|| {
            AppError::NotFound("No accepted application for this project".to_string())
        })?;

    if !project.status.can_transition_to(ProjectStatus::Done) {
        return Err(AppError::InvalidState(format!(
            "Project is {}; finishing can only be submitted while ONGOING",
            project.status
        )));
    }

    validate_link(finishing_link)?;
    let link = finishing_link.trim();

    let updated = db::projects::mark_done(&mut *tx, project_id, Some(link))
        .await?
        .ok_or_else(|| AppError::InvalidState("Project is no longer ongoing".to_string()))?;
    db::applications::record_finishing(&mut *tx, application.id, Some(link)).await?;

    tx.commit().await?;

    tracing::info!("Finishing submitted for project {project_id} by {worker_id}");

    activity::record_for_project(
        &state.pool,
        worker_id,
        ActivityType::FinishingSubmitted,
        &format!("Submitted finished work for \"{}\"", project.title),
        project_id,
    )
    .await;

    state
        .notifier
        .notify(notifier::about_project(
            project.owner_id,
            kind::FINISHING_SUBMITTED,
            "Work marked as finished",
            format!("The work on \"{}\" is ready for your confirmation", project.title),
            project_id,
        ))
        .await;

    Ok(updated)
}

/// The owner confirms a finished project, closing it.
pub async fn confirm_finishing(
    state: &AppState,
    project_id: Uuid,
    owner_id: Uuid,
) -> Result<Project, AppError> {
    let mut tx = state.pool.begin().await?;

    let project = db::projects::lock_by_id(&mut *tx, project_id)
        .await?
        .ok_or_else(project_not_found)?;
    require_owner(&project, owner_id)?;

    let (closed, applicant) = close_project(&mut *tx, &project, owner_id).await?;
    // Approving a deliverable already announced completion.
    let already_announced = db::work_submissions::has_approved(&mut *tx, project_id).await?;

    tx.commit().await?;

    tracing::info!("Project {project_id} closed by {owner_id}");

    if !already_announced {
        announce_completion(state, &closed, applicant.as_ref().map(|a| a.applicant_id)).await;
    }

    Ok(closed)
}

/// DONE -> CLOSED. The single path by which any project is closed.
pub(crate) async fn close_project(
    conn: &mut PgConnection,
    project: &Project,
    confirmed_by: Uuid,
) -> Result<(Project, Option<Application>), AppError> {
    if !project.status.can_transition_to(ProjectStatus::Closed) {
        return Err(AppError::InvalidState(format!(
            "Project is {}; only DONE projects can be closed",
            project.status
        )));
    }

    let closed = db::projects::mark_closed(&mut *conn, project.id, confirmed_by)
        .await?
        .ok_or_else(|| AppError::InvalidState("Project is no longer done".to_string()))?;

    let applicant = db::applications::find_approved(&mut *conn, project.id).await?;
    if let Some(app) = &applicant {
        db::applications::mark_finished_by_applicant(&mut *conn, app.id).await?;
    }

    Ok((closed, applicant))
}

pub(crate) async fn announce_completion(state: &AppState, project: &Project, applicant_id: Option<Uuid>) {
    let description = format!("Project \"{}\" completed", project.title);

    activity::record_for_project(
        &state.pool,
        project.owner_id,
        ActivityType::ProjectCompleted,
        &description,
        project.id,
    )
    .await;

    if let Some(applicant_id) = applicant_id {
        activity::record_for_project(
            &state.pool,
            applicant_id,
            ActivityType::ProjectCompleted,
            &description,
            project.id,
        )
        .await;

        state
            .notifier
            .notify(notifier::about_project(
                applicant_id,
                kind::PROJECT_COMPLETED,
                "Project completed",
                format!("\"{}\" has been completed", project.title),
                project.id,
            ))
            .await;
    }
}

pub async fn get_status(pool: &PgPool, project_id: Uuid, user_id: Uuid) -> Result<FinishingStatus, AppError> {
    let project = db::projects::find_by_id(pool, project_id)
        .await?
        .ok_or_else(project_not_found)?;

    let accepted = db::applications::find_approved(pool, project_id)
        .await?
        .filter(|a| a.applicant_id == user_id);

    if !project.is_owned_by(user_id) && accepted.is_none() {
        return Err(AppError::Forbidden(
            "Only the owner and the accepted applicant can view finishing status".to_string(),
        ));
    }

    Ok(FinishingStatus {
        project_id,
        status: project.status,
        finishing_link: project.finishing_link,
        finishing_submitted_at: project.finishing_submitted_at,
        finished_at: project.finished_at,
        finishing_confirmed_by: project.finishing_confirmed_by,
        application: accepted.map(|a| ApplicationFinishing {
            application_id: a.id,
            finishing_link: a.finishing_link,
            finishing_submitted_at: a.finishing_submitted_at,
            finished_by_applicant: a.finished_by_applicant,
        }),
    })
}
