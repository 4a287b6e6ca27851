pub mod admin;
pub mod applications;
pub mod auth;
pub mod feed;
pub mod finishing;
pub mod projects;
pub mod submissions;

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        // Projects
        .route("/api/v1/projects", get(projects::list).post(projects::create))
        .route(
            "/api/v1/projects/{id}",
            get(projects::get).delete(projects::delete),
        )
        .route("/api/v1/projects/{id}/brief", put(projects::update_brief))
        .route("/api/v1/projects/{id}/deadline", get(projects::deadline))
        .route("/api/v1/projects/{id}/contract", get(projects::contract))
        // Applications
        .route("/api/v1/projects/{id}/apply", post(applications::apply))
        .route(
            "/api/v1/projects/{id}/applications",
            get(applications::list_by_project),
        )
        .route("/api/v1/applications/mine", get(applications::mine))
        .route("/api/v1/applications/{id}/accept", post(applications::accept))
        .route("/api/v1/applications/{id}/reject", post(applications::reject))
        // Finishing
        .route(
            "/api/v1/projects/{id}/finishing",
            get(finishing::status).post(finishing::submit),
        )
        .route(
            "/api/v1/projects/{id}/finishing/confirm",
            post(finishing::confirm),
        )
        // Work submissions
        .route(
            "/api/v1/files/submission/{id}",
            get(submissions::get).post(submissions::create),
        )
        .route(
            "/api/v1/files/submission/{id}/review",
            post(submissions::review),
        )
        .route("/api/v1/files/submissions/mine", get(submissions::mine))
        .route(
            "/api/v1/files/submissions/{id}",
            get(submissions::list_by_project),
        )
        // Feed
        .route("/api/v1/notifications", get(feed::notifications))
        .route("/api/v1/notifications/stream", get(feed::stream))
        .route("/api/v1/notifications/{id}/read", post(feed::mark_read))
        .route("/api/v1/activities", get(feed::activities))
        // Admin
        .route("/api/v1/admin/sweep", post(admin::sweep))
}
