use std::convert::Infallible;

use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::feed::notifier::LiveUpdate;
use crate::models::{Activity, Notification};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageQuery {
    fn bounds(&self) -> (i64, i64) {
        (
            self.limit.unwrap_or(50).clamp(1, 200),
            self.offset.unwrap_or(0).max(0),
        )
    }
}

#[derive(Serialize)]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub unread_count: i64,
}

pub async fn notifications(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<NotificationList>, AppError> {
    let (limit, offset) = page.bounds();
    let notifications =
        db::notifications::list_by_user(&state.pool, auth.user_id, limit, offset).await?;
    let unread_count = db::notifications::count_unread(&state.pool, auth.user_id).await?;
    Ok(Json(NotificationList {
        notifications,
        unread_count,
    }))
}

pub async fn mark_read(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !db::notifications::mark_read(&state.pool, id, auth.user_id).await? {
        return Err(AppError::NotFound("Notification not found".to_string()));
    }
    let unread_count = db::notifications::count_unread(&state.pool, auth.user_id).await?;
    Ok(Json(serde_json::json!({ "unread_count": unread_count })))
}

pub async fn activities(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<Activity>>, AppError> {
    let (limit, offset) = page.bounds();
    Ok(Json(
        db::activities::list_by_user(&state.pool, auth.user_id, limit, offset).await?,
    ))
}

/// Server-sent stream of the caller's own live updates.
pub async fn stream(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let user_id = auth.user_id;
    let rx = state.notifier.subscribe();

    let events = futures_util::stream::unfold(rx, move |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(update) if addressed_to(&update, user_id) => {
                    let event = Event::default()
                        .json_data(&update)
                        .unwrap_or_else(|_| Event::default().comment("unserializable update"));
                    return Some((Ok(event), rx));
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Live stream for {user_id} skipped {skipped} updates");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

fn addressed_to(update: &LiveUpdate, user_id: Uuid) -> bool {
    match update {
        LiveUpdate::Notification { notification } => notification.user_id == user_id,
        LiveUpdate::UnreadCount { user_id: to, .. } => *to == user_id,
    }
}
