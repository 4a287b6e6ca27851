use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::email::SystemMailer;
use crate::feed::notifier::Notifier;
use crate::rate_limit::{ApplyRateLimiter, LoginRateLimiter};
use crate::storage::FileStore;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub files: Arc<dyn FileStore>,
    pub notifier: Notifier,
    pub system_mailer: Option<Arc<SystemMailer>>,
    pub apply_limiter: ApplyRateLimiter,
    pub login_limiter: LoginRateLimiter,
}
