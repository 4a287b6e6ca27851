use sqlx::PgPool;
use uuid::Uuid;

use crate::config::CompletionPolicy;
use crate::db;
use crate::error::AppError;
use crate::feed::activity::{self, ActivityType};
use crate::feed::notifier::{self, kind};
use crate::models::work_submission::{join_links, split_links, Verdict};
use crate::models::{ApplicationStatus, Project, ProjectStatus, WorkSubmission};
use crate::state::AppState;
use crate::storage::{self, FileRef, UploadedFile};

use super::finishing::{announce_completion, close_project};
use super::{project_not_found, require_owner, validate_link};

fn submission_not_found() -> AppError {
    AppError::NotFound("Submission not found".to_string())
}

/// A deliverable as received from the worker.
#[derive(Debug, Default)]
pub struct SubmissionInput {
    pub description: String,
    pub links: Vec<String>,
    pub files: Vec<UploadedFile>,
}

/// Record a deliverable and move the project to DONE. Files are stored
/// before the transaction and discarded again if it fails.
pub async fn create_submission(
    state: &AppState,
    project_id: Uuid,
    submitter_id: Uuid,
    input: SubmissionInput,
) -> Result<WorkSubmission, AppError> {
    let project = db::projects::find_by_id(&state.pool, project_id)
        .await?
        .ok_or_else(project_not_found)?;
    check_can_submit(&state.pool, &project, submitter_id).await?;

    let description = input.description.trim().to_string();
    let links = join_links(&input.links);
    for link in split_links(&links) {
        validate_link(link)?;
    }
    if description.is_empty() && links.is_empty() && input.files.is_empty() {
        return Err(AppError::Validation(
            "A submission needs a description, a link or a file".to_string(),
        ));
    }

    let subdirectory = format!("submissions/{project_id}");
    let mut stored: Vec<FileRef> = Vec::with_capacity(input.files.len());
    for file in &input.files {
        match state.files.store(file, &subdirectory).await {
            Ok(file_ref) => stored.push(file_ref),
            Err(e) => {
                storage::discard(state.files.as_ref(), &stored).await;
                return Err(AppError::Io(format!(
                    "Failed to store {}: {e}",
                    file.file_name
                )));
            }
        }
    }

    let file_refs: Vec<String> = stored.iter().map(|f| f.as_str().to_string()).collect();
    let first_link = split_links(&links).first().map(|l| l.to_string());

    let result = async {
        let mut tx = state.pool.begin().await?;

        let locked = db::projects::lock_by_id(&mut *tx, project_id)
            .await?
            .ok_or_else(project_not_found)?;
        if locked.status != ProjectStatus::Ongoing {
            return Err(not_ongoing(locked.status));
        }

        let submission = db::work_submissions::create(
            &mut *tx,
            project_id,
            submitter_id,
            &description,
            &links,
            &file_refs,
        )
        .await?;

        db::projects::mark_done(&mut *tx, project_id, first_link.as_deref())
            .await?
            .ok_or_else(|| not_ongoing(locked.status))?;

        tx.commit().await?;
        Ok::<_, AppError>(submission)
    }
    .await;

    let submission = match result {
        Ok(submission) => submission,
        Err(e) => {
            storage::discard(state.files.as_ref(), &stored).await;
            return Err(e);
        }
    };

    tracing::info!(
        "Submission {} on project {project_id} ({} files)",
        submission.id,
        submission.files.len()
    );

    activity::record(
        &state.pool,
        submitter_id,
        ActivityType::WorkSubmitted,
        &format!("Submitted work for \"{}\"", project.title),
        Some("work_submission"),
        Some(submission.id),
    )
    .await;

    state
        .notifier
        .notify(notifier::about_project(
            project.owner_id,
            kind::WORK_SUBMITTED,
            "Work submitted for review",
            format!("New deliverables were submitted for \"{}\"", project.title),
            project_id,
        ))
        .await;

    Ok(submission)
}

async fn check_can_submit(pool: &PgPool, project: &Project, submitter_id: Uuid) -> Result<(), AppError> {
    let accepted = db::applications::find_by_project_and_applicant(pool, project.id, submitter_id)
        .await?
        .is_some_and(|a| a.status == ApplicationStatus::Approved);
    if !accepted {
        return Err(AppError::Forbidden(
            "Only the accepted applicant can submit work".to_string(),
        ));
    }
    if project.status != ProjectStatus::Ongoing {
        return Err(not_ongoing(project.status));
    }
    Ok(())
}

fn not_ongoing(status: ProjectStatus) -> AppError {
    AppError::InvalidState(format!(
        "Project is {status}; work can only be submitted while ONGOING"
    ))
}

/// The owner's verdict on the latest pending submission.
pub async fn review(
    state: &AppState,
    submission_id: Uuid,
    reviewer_id: Uuid,
    verdict: Verdict,
    feedback: Option<String>,
) -> Result<WorkSubmission, AppError> {
    let feedback = feedback
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty());

    let mut tx = state.pool.begin().await?;

    let submission = db::work_submissions::find_by_id(&mut *tx, submission_id)
        .await?
        .ok_or_else(submission_not_found)?;
    let project = db::projects::lock_by_id(&mut *tx, submission.project_id)
        .await?
        .ok_or_else(project_not_found)?;
    require_owner(&project, reviewer_id)?;

    if !submission.is_pending() {
        return Err(AppError::InvalidState(
            "Submission has already been reviewed".to_string(),
        ));
    }
    let latest = db::work_submissions::latest_pending(&mut *tx, project.id).await?;
    if latest.as_ref().map(|s| s.id) != Some(submission.id) {
        return Err(AppError::InvalidState(
            "Only the most recent pending submission can be reviewed".to_string(),
        ));
    }

    let mut closed = None;
    match verdict {
        Verdict::Rejected => {
            if !project.status.can_transition_to(ProjectStatus::Ongoing) {
                return Err(AppError::InvalidState(format!(
                    "Project is {}; rejected work can only reopen a DONE project",
                    project.status
                )));
            }
            db::projects::reopen_for_resubmission(&mut *tx, project.id)
                .await?
                .ok_or_else(|| AppError::InvalidState("Project is no longer done".to_string()))?;
            if let Some(app) = db::applications::find_approved(&mut *tx, project.id).await? {
                db::applications::clear_finishing(&mut *tx, app.id).await?;
            }
        }
        Verdict::Approved => {
            if state.config.completion_policy == CompletionPolicy::ReviewCloses {
                closed = Some(close_project(&mut *tx, &project, reviewer_id).await?);
            }
        }
    }

    let reviewed = db::work_submissions::record_verdict(
        &mut *tx,
        submission.id,
        verdict.as_status(),
        feedback.as_deref(),
    )
    .await?
    .ok_or_else(|| AppError::InvalidState("Submission has already been reviewed".to_string()))?;

    tx.commit().await?;

    tracing::info!(
        "Submission {submission_id} on project {} reviewed: {}",
        project.id,
        verdict.as_status()
    );

    announce_verdict(state, &project, &reviewed, verdict).await;
    if verdict == Verdict::Approved {
        // Once per approval whatever the policy; a later confirm stays quiet.
        let completed = match &closed {
            Some((closed, _)) => {
                tracing::info!("Project {} closed by approved review", closed.id);
                closed
            }
            None => &project,
        };
        announce_completion(state, completed, Some(reviewed.submitter_id)).await;
    }

    Ok(reviewed)
}

async fn announce_verdict(state: &AppState, project: &Project, submission: &WorkSubmission, verdict: Verdict) {
    let submitter = submission.submitter_id;
    match verdict {
        Verdict::Rejected => {
            activity::record(
                &state.pool,
                submitter,
                ActivityType::WorkRejected,
                &format!("Your work on \"{}\" needs changes", project.title),
                Some("work_submission"),
                Some(submission.id),
            )
            .await;
            state
                .notifier
                .notify(notifier::about_project(
                    submitter,
                    kind::WORK_REJECTED,
                    "Changes requested",
                    submission
                        .feedback
                        .clone()
                        .unwrap_or_else(|| format!("Your work on \"{}\" was not accepted", project.title)),
                    project.id,
                ))
                .await;
        }
        Verdict::Approved => {
            activity::record(
                &state.pool,
                submitter,
                ActivityType::WorkAccepted,
                &format!("Your work on \"{}\" was accepted", project.title),
                Some("work_submission"),
                Some(submission.id),
            )
            .await;
            state
                .notifier
                .notify(notifier::about_project(
                    submitter,
                    kind::WORK_ACCEPTED,
                    "Work accepted",
                    format!("Your work on \"{}\" was accepted", project.title),
                    project.id,
                ))
                .await;
        }
    }
}

pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<WorkSubmission>, AppError> {
    Ok(db::work_submissions::list_by_project(pool, project_id).await?)
}

pub async fn get_by_id(pool: &PgPool, submission_id: Uuid) -> Result<WorkSubmission, AppError> {
    db::work_submissions::find_by_id(pool, submission_id)
        .await?
        .ok_or_else(submission_not_found)
}

pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<WorkSubmission>, AppError> {
    Ok(db::work_submissions::list_by_user(pool, user_id).await?)
}
