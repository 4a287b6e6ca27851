pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod feed;
pub mod models;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod storage;
pub mod sweeper;
pub mod upload;
pub mod workflow;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::email::SystemMailer;
use crate::feed::notifier::Notifier;
use crate::rate_limit::{ApplyRateLimiter, LoginRateLimiter};
use crate::state::{AppState, SharedState};
use crate::storage::local::LocalFileStore;

pub fn build_state(pool: PgPool, config: Config) -> SharedState {
    let system_mailer = config.smtp.as_ref().and_then(|smtp| match SystemMailer::new(smtp) {
        Ok(mailer) => {
            tracing::info!("System SMTP configured");
            Some(Arc::new(mailer))
        }
        Err(e) => {
            tracing::warn!("System SMTP not available: {e}");
            None
        }
    });

    let notifier = Notifier::new(pool.clone(), system_mailer.clone(), config.base_url.clone());
    let files = Arc::new(LocalFileStore::new(config.upload_dir.clone()));

    Arc::new(AppState {
        pool,
        config,
        files,
        notifier,
        system_mailer,
        apply_limiter: ApplyRateLimiter::new(),
        login_limiter: LoginRateLimiter::new(),
    })
}

pub fn build_router(state: SharedState) -> Router {
    let max_upload = state.config.max_upload_size;

    Router::new()
        .merge(routes::api_routes())
        .route("/health", axum::routing::get(health))
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(max_upload))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-content-type-options"),
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-frame-options"),
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("referrer-policy"),
                    HeaderValue::from_static("strict-origin-when-cross-origin"),
                )),
        )
        .with_state(state)
}

/// Router plus the state it shares with the sweeper.
pub fn build_app(pool: PgPool, config: Config) -> (Router, SharedState) {
    let state = build_state(pool, config);
    (build_router(state.clone()), state)
}

async fn health() -> &'static str {
    "ok"
}
