//! The engagement lifecycle. Each operation runs its mutations in one
//! transaction and emits activities and notifications only after commit.

pub mod applications;
pub mod finishing;
pub mod registry;
pub mod review;

use sqlx::PgPool;
use url::{Host, Url};
use uuid::Uuid;

use crate::db;
use crate::error::AppError;
use crate::models::{ApplicationStatus, Project, User};

pub(crate) fn project_not_found() -> AppError {
    AppError::NotFound("Project not found".to_string())
}

pub(crate) fn require_owner(project: &Project, user_id: Uuid) -> Result<(), AppError> {
    if project.is_owned_by(user_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only the project owner can do this".to_string(),
        ))
    }
}

/// Owner or accepted applicant; nobody else sees a project's deliverables
/// or contract.
pub async fn require_participant(pool: &PgPool, project_id: Uuid, user_id: Uuid) -> Result<Project, AppError> {
    let project = db::projects::find_by_id(pool, project_id)
        .await?
        .ok_or_else(project_not_found)?;
    if project.is_owned_by(user_id) {
        return Ok(project);
    }
    let accepted = db::applications::find_by_project_and_applicant(pool, project_id, user_id)
        .await?
        .is_some_and(|a| a.status == ApplicationStatus::Approved);
    if accepted {
        Ok(project)
    } else {
        Err(AppError::Forbidden(
            "Only project participants can see this".to_string(),
        ))
    }
}

pub(crate) fn user_not_found(user: Option<User>) -> Result<User, AppError> {
    user.ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Accept only absolute http(s) URLs with a real host for deliverable and
/// finishing links.
pub(crate) fn validate_link(link: &str) -> Result<(), AppError> {
    let link = link.trim();
    let invalid = || AppError::Validation(format!("Invalid link '{link}': must be an http(s) URL"));

    let url = Url::parse(link).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    match url.host() {
        Some(Host::Domain(domain)) if is_hostname(domain) => Ok(()),
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => Ok(()),
        _ => Err(invalid()),
    }
}

/// The url crate already lowercases and punycode-encodes domains, but it
/// lets through punctuation such as ','.
fn is_hostname(domain: &str) -> bool {
    domain.split('.').all(|label| {
        !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}
