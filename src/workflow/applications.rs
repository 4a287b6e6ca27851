use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::role::Capability;
use crate::db;
use crate::error::AppError;
use crate::feed::activity::{self, ActivityType};
use crate::feed::notifier::{self, kind};
use crate::models::{Application, ApplicationStatus, ApplicationSummary, ProjectStatus};
use crate::state::AppState;

use super::{project_not_found, require_owner, user_not_found};

fn application_not_found() -> AppError {
    AppError::NotFound("Application not found".to_string())
}

/// Place a bid on an open project.
pub async fn apply(
    state: &AppState,
    project_id: Uuid,
    applicant_id: Uuid,
    proposal: &str,
    bid_amount: Decimal,
) -> Result<ApplicationSummary, AppError> {
    let applicant = user_not_found(db::users::find_by_id(&state.pool, applicant_id).await?)?;
    applicant.role.require(Capability::BidOnProjects)?;

    let project = db::projects::find_by_id(&state.pool, project_id)
        .await?
        .ok_or_else(project_not_found)?;
    require_open(project.status)?;

    if db::applications::find_by_project_and_applicant(&state.pool, project_id, applicant_id)
        .await?
        .is_some()
    {
        return Err(already_applied());
    }

    let proposal = proposal.trim();
    if proposal.is_empty() {
        return Err(AppError::Validation("Proposal is required".to_string()));
    }
    if bid_amount < Decimal::ZERO {
        return Err(AppError::Validation(
            "Bid amount must not be negative".to_string(),
        ));
    }

    // Taken before the project row is locked, and given back if the bid is
    // not stored after all.
    if let Err(retry_after) = state.apply_limiter.check(
        applicant_id,
        state.config.apply_rate_limit,
        state.config.apply_rate_window_secs,
    ) {
        return Err(AppError::RateLimited(format!(
            "Too many applications. Retry after {retry_after}s"
        )));
    }

    let application = match store_application(state, project_id, applicant_id, proposal, bid_amount).await {
        Ok(application) => application,
        Err(e) => {
            state.apply_limiter.refund(applicant_id);
            return Err(e);
        }
    };

    tracing::info!(
        "Application {} by {applicant_id} on project {project_id}",
        application.id
    );

    activity::record(
        &state.pool,
        applicant_id,
        ActivityType::ApplicationSubmitted,
        &format!("Applied to \"{}\"", project.title),
        Some("application"),
        Some(application.id),
    )
    .await;

    state
        .notifier
        .notify(notifier::about_project(
            project.owner_id,
            kind::APPLICATION_RECEIVED,
            "New application",
            format!("{} applied to \"{}\" with a bid of {bid_amount}", applicant.name, project.title),
            project_id,
        ))
        .await;

    Ok(ApplicationSummary::from(&application))
}

fn already_applied() -> AppError {
    AppError::Conflict("You have already applied to this project".to_string())
}

fn require_open(status: ProjectStatus) -> Result<(), AppError> {
    if status == ProjectStatus::Open {
        Ok(())
    } else {
        Err(AppError::InvalidState(format!(
            "Project is {status} and no longer accepts applications"
        )))
    }
}

/// Insert the bid with the project row locked, so a concurrent accept
/// cannot move the project out of OPEN between the check and the insert.
async fn store_application(
    state: &AppState,
    project_id: Uuid,
    applicant_id: Uuid,
    proposal: &str,
    bid_amount: Decimal,
) -> Result<Application, AppError> {
    let mut tx = state.pool.begin().await?;

    let project = db::projects::lock_by_id(&mut *tx, project_id)
        .await?
        .ok_or_else(project_not_found)?;
    require_open(project.status)?;

    let application =
        db::applications::create(&mut *tx, project_id, applicant_id, proposal, bid_amount)
            .await
            .map_err(|e| AppError::conflict_on_unique(e, "You have already applied to this project"))?;
    db::projects::increment_applicant_count(&mut *tx, project_id).await?;

    tx.commit().await?;
    Ok(application)
}

/// Accept a bid. At most one application per project can ever be approved:
/// the project row is locked for the whole transaction, and the partial
/// unique index on approved applications backs that up at commit.
pub async fn accept(
    state: &AppState,
    application_id: Uuid,
    owner_id: Uuid,
) -> Result<Application, AppError> {
    let mut tx = state.pool.begin().await?;

    let application = db::applications::find_by_id(&mut *tx, application_id)
        .await?
        .ok_or_else(application_not_found)?;

    let project = db::projects::lock_by_id(&mut *tx, application.project_id)
        .await?
        .ok_or_else(project_not_found)?;
    require_owner(&project, owner_id)?;

    if let Some(approved) = db::applications::find_approved(&mut *tx, project.id).await? {
        if approved.id == application_id {
            return Err(AppError::InvalidState(
                "Application has already been accepted".to_string(),
            ));
        }
        return Err(AppError::Conflict(
            "Another application has already been accepted for this project".to_string(),
        ));
    }

    if project.status != ProjectStatus::Open {
        return Err(AppError::InvalidState(format!(
            "Project is {} and cannot accept applications",
            project.status
        )));
    }

    if application.status != ApplicationStatus::Pending {
        return Err(AppError::InvalidState(
            "Only pending applications can be accepted".to_string(),
        ));
    }

    let accepted = db::applications::approve(&mut *tx, application_id)
        .await
        .map_err(|e| {
            AppError::conflict_on_unique(
                e,
                "Another application has already been accepted for this project",
            )
        })?
        .ok_or_else(|| AppError::InvalidState("Application is no longer pending".to_string()))?;

    db::projects::mark_ongoing(&mut *tx, project.id)
        .await?
        .ok_or_else(|| AppError::InvalidState("Project is no longer open".to_string()))?;

    let body = format!(
        "Engagement for \"{}\": the applicant delivers the agreed scope for {} by {}.",
        project.title,
        accepted.bid_amount,
        project
            .deadline
            .map(|d| d.to_string())
            .unwrap_or_else(|| "the agreed date".to_string()),
    );
    db::contracts::create(&mut *tx, project.id, accepted.applicant_id, owner_id, &body)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "A contract already exists for this project"))?;

    tx.commit().await?;

    tracing::info!(
        "Application {application_id} accepted on project {}",
        project.id
    );

    activity::record_for_project(
        &state.pool,
        accepted.applicant_id,
        ActivityType::ApplicationAccepted,
        &format!("Your application to \"{}\" was accepted", project.title),
        project.id,
    )
    .await;

    state
        .notifier
        .notify(notifier::about_project(
            accepted.applicant_id,
            kind::APPLICATION_ACCEPTED,
            "Application accepted",
            format!("Your application to \"{}\" was accepted", project.title),
            project.id,
        ))
        .await;

    Ok(accepted)
}

pub async fn reject(
    state: &AppState,
    application_id: Uuid,
    owner_id: Uuid,
) -> Result<Application, AppError> {
    let mut tx = state.pool.begin().await?;

    let application = db::applications::find_by_id(&mut *tx, application_id)
        .await?
        .ok_or_else(application_not_found)?;
    let project = db::projects::find_by_id(&mut *tx, application.project_id)
        .await?
        .ok_or_else(project_not_found)?;
    require_owner(&project, owner_id)?;

    let rejected = db::applications::reject(&mut *tx, application_id)
        .await?
        .ok_or_else(|| {
            AppError::InvalidState("Only pending applications can be rejected".to_string())
        })?;

    tx.commit().await?;

    state
        .notifier
        .notify(notifier::about_project(
            rejected.applicant_id,
            kind::APPLICATION_REJECTED,
            "Application declined",
            format!("Your application to \"{}\" was declined", project.title),
            project.id,
        ))
        .await;

    Ok(rejected)
}

pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Application>, AppError> {
    Ok(db::applications::list_by_project(pool, project_id).await?)
}

pub async fn list_by_applicant(
    pool: &PgPool,
    applicant_id: Uuid,
) -> Result<Vec<Application>, AppError> {
    Ok(db::applications::list_by_applicant(pool, applicant_id).await?)
}

pub async fn find_by_project_and_applicant(
    pool: &PgPool,
    project_id: Uuid,
    applicant_id: Uuid,
) -> Result<Option<Application>, AppError> {
    Ok(db::applications::find_by_project_and_applicant(pool, project_id, applicant_id).await?)
}
