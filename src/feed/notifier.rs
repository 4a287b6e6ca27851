use std::sync::Arc;

use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::db;
use crate::email::SystemMailer;
use crate::models::notification::NewNotification;
use crate::models::Notification;

pub mod kind {
    pub const APPLICATION_RECEIVED: &str = "application_received";
    pub const APPLICATION_ACCEPTED: &str = "application_accepted";
    pub const APPLICATION_REJECTED: &str = "application_rejected";
    pub const FINISHING_SUBMITTED: &str = "finishing_submitted";
    pub const PROJECT_COMPLETED: &str = "project_completed";
    pub const WORK_SUBMITTED: &str = "work_submitted";
    pub const WORK_ACCEPTED: &str = "work_accepted";
    pub const WORK_REJECTED: &str = "work_rejected";
    pub const PROJECT_OVERDUE: &str = "project_overdue";
}

/// Pushed to live subscribers after a notification is stored.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveUpdate {
    Notification { notification: Notification },
    UnreadCount { user_id: Uuid, count: i64 },
}

/// Persists notifications and fans them out to live subscribers and, when
/// SMTP is configured, to email. Delivery is best-effort throughout.
pub struct Notifier {
    pool: PgPool,
    live: broadcast::Sender<LiveUpdate>,
    mailer: Option<Arc<SystemMailer>>,
    base_url: String,
}

impl Notifier {
    pub fn new(pool: PgPool, mailer: Option<Arc<SystemMailer>>, base_url: String) -> Self {
        let (live, _) = broadcast::channel(256);
        Self {
            pool,
            live,
            mailer,
            base_url,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveUpdate> {
        self.live.subscribe()
    }

    pub async fn notify(&self, new: NewNotification<'_>) {
        let notification = match db::notifications::create(&self.pool, &new).await {
            Ok(n) => n,
            Err(e) => {
                tracing::error!(
                    "Failed to store {} notification for user {}: {e}",
                    new.notification_type,
                    new.user_id
                );
                return;
            }
        };

        // A send error only means nobody is listening.
        let _ = self.live.send(LiveUpdate::Notification {
            notification: notification.clone(),
        });

        match db::notifications::count_unread(&self.pool, new.user_id).await {
            Ok(count) => {
                let _ = self.live.send(LiveUpdate::UnreadCount {
                    user_id: new.user_id,
                    count,
                });
            }
            Err(e) => tracing::warn!("Failed to count unread notifications: {e}"),
        }

        if let Some(mailer) = &self.mailer {
            self.mail(mailer, &notification).await;
        }
    }

    async fn mail(&self, mailer: &SystemMailer, notification: &Notification) {
        let user = match db::users::find_by_id(&self.pool, notification.user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!("Failed to load notification recipient: {e}");
                return;
            }
        };

        let link = notification
            .action_url
            .as_ref()
            .map(|path| format!("{}{path}", self.base_url));

        if let Err(e) = mailer
            .send_notification(
                &user.email,
                &user.name,
                &notification.title,
                &notification.message,
                link.as_deref(),
            )
            .await
        {
            tracing::warn!("Failed to email notification {}: {e}", notification.id);
        }
    }
}

/// Build a notification about a project.
pub fn about_project<'a>(
    user_id: Uuid,
    notification_type: &'a str,
    title: impl Into<String>,
    message: impl Into<String>,
    project_id: Uuid,
) -> NewNotification<'a> {
    NewNotification {
        user_id,
        notification_type,
        title: title.into(),
        message: message.into(),
        related_entity_type: Some("project"),
        related_entity_id: Some(project_id),
        action_url: Some(format!("/projects/{project_id}")),
    }
}
