use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use sqlx::PgPool;
use tokio::sync::watch;
use uuid::Uuid;

use crate::db;
use crate::error::AppError;
use crate::feed::activity::{self, ActivityType};
use crate::feed::notifier::{self, kind};
use crate::models::{Application, Project, ProjectStatus};
use crate::state::SharedState;

/// Start the daily deadline sweep on a dedicated thread with its own
/// runtime. Blocks that thread until shutdown is signaled.
pub fn spawn(state: SharedState, mut shutdown: watch::Receiver<bool>) -> std::thread::JoinHandle<()> {
    std::thread::Builder::new()
        .name("deadline-sweeper".into())
        .spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("Failed to build sweeper runtime");

            runtime.block_on(async {
                let hour = state.config.sweep_hour;
                tracing::info!("Deadline sweeper started (daily at {hour:02}:00 UTC)");

                loop {
                    if *shutdown.borrow() {
                        break;
                    }

                    let now = Utc::now();
                    let wait = (next_run_after(now, hour) - now)
                        .to_std()
                        .unwrap_or(Duration::ZERO);
                    tracing::debug!("Next deadline sweep in {}s", wait.as_secs());

                    tokio::select! {
                        _ = tokio::time::sleep(wait) => sweep(&state).await,
                        changed = shutdown.changed() => {
                            if changed.is_err() {
                                break;
                            }
                        }
                    }
                }

                tracing::info!("Deadline sweeper stopped");
            });
        })
        .expect("Failed to spawn sweeper thread")
}

/// One scheduled run. Also trims the in-memory rate limiters.
pub async fn sweep(state: &SharedState) {
    match check_and_mark_overdue_projects(state).await {
        Ok(0) => tracing::debug!("Deadline sweep: nothing overdue"),
        Ok(n) => tracing::info!("Deadline sweep: {n} projects marked overdue"),
        Err(e) => tracing::error!("Deadline sweep failed: {e}"),
    }

    let window = Duration::from_secs(state.config.apply_rate_window_secs);
    state.apply_limiter.cleanup(window);
    state.login_limiter.cleanup(Duration::from_secs(3600));
}

/// Mark every elapsed OPEN/ONGOING project as OVERDUE. Returns how many
/// projects this run moved; a second run on the same day returns 0.
pub async fn check_and_mark_overdue_projects(state: &SharedState) -> Result<usize, AppError> {
    mark_overdue_as_of(state, Utc::now().date_naive()).await
}

pub async fn mark_overdue_as_of(state: &SharedState, today: NaiveDate) -> Result<usize, AppError> {
    let candidates = db::projects::list_overdue_candidates(&state.pool, today).await?;
    let mut marked = 0;

    for candidate in candidates {
        match mark_one(&state.pool, candidate.id, today).await {
            Ok(Some((project, applicant))) => {
                marked += 1;
                announce_overdue(state, &project, applicant.as_ref()).await;
            }
            // Moved on since the candidate query ran.
            Ok(None) => {}
            Err(e) => {
                tracing::error!("Failed to mark project {} overdue: {e}", candidate.id);
            }
        }
    }

    Ok(marked)
}

async fn mark_one(
    pool: &PgPool,
    project_id: Uuid,
    today: NaiveDate,
) -> Result<Option<(Project, Option<Application>)>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(project) = db::projects::mark_overdue(&mut *tx, project_id, today).await? else {
        return Ok(None);
    };
    let applicant = db::applications::find_approved(&mut *tx, project_id).await?;

    tx.commit().await?;
    Ok(Some((project, applicant)))
}

async fn announce_overdue(state: &SharedState, project: &Project, applicant: Option<&Application>) {
    tracing::info!("Project {} is overdue", project.id);

    let description = format!("Project \"{}\" passed its deadline", project.title);
    let recipients = std::iter::once(project.owner_id).chain(applicant.map(|a| a.applicant_id));

    for user_id in recipients {
        activity::record_for_project(
            &state.pool,
            user_id,
            ActivityType::ProjectOverdue,
            &description,
            project.id,
        )
        .await;

        state
            .notifier
            .notify(notifier::about_project(
                user_id,
                kind::PROJECT_OVERDUE,
                "Project overdue",
                description.clone(),
                project.id,
            ))
            .await;
    }
}

pub async fn is_overdue(pool: &PgPool, project_id: Uuid) -> Result<bool, AppError> {
    let project = db::projects::find_by_id(pool, project_id).await?;
    Ok(project.is_some_and(|p| project_is_overdue(&p, Utc::now().date_naive())))
}

pub async fn days_until_deadline(pool: &PgPool, project_id: Uuid) -> Result<i64, AppError> {
    let project = db::projects::find_by_id(pool, project_id).await?;
    Ok(project
        .map(|p| project_days_left(&p, Utc::now().date_naive()))
        .unwrap_or(0))
}

/// Only OPEN/ONGOING projects can be overdue; once the sweep has frozen a
/// project at OVERDUE it is terminal and reads as neutral like DONE/CLOSED.
fn project_is_overdue(project: &Project, today: NaiveDate) -> bool {
    project.status.is_unfinished() && project.deadline.is_some_and(|d| d < today)
}

fn project_days_left(project: &Project, today: NaiveDate) -> i64 {
    if !project.status.is_unfinished() {
        return 0;
    }
    project
        .deadline
        .map(|d| days_between(today, d))
        .unwrap_or(0)
}

/// Signed whole days from `from` to `to`.
fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// The next `hour:00` UTC strictly after `now`.
fn next_run_after(now: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    let hour = hour.min(23);
    let today = now
        .date_naive()
        .and_hms_opt(hour, 0, 0)
        .map(|t| t.and_utc())
        .unwrap_or(now);
    if today > now {
        today
    } else {
        today + TimeDelta::days(1)
    }
}
