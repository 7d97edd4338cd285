use api_types::notification::{MarkedRead, NotificationQuery, NotificationView, UnreadCount};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views};

pub async fn list(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Query(query): Query<NotificationQuery>,
) -> Result<(StatusCode, Json<Vec<NotificationView>>), ServerError> {
    let notifications = state
        .engine
        .notifications(user.id, query.unread_only)
        .await?;
    Ok((
        StatusCode::OK,
        Json(notifications.iter().map(views::notification_view).collect()),
    ))
}

pub async fn unread(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
) -> Result<(StatusCode, Json<UnreadCount>), ServerError> {
    let unread = state.engine.unread_count(user.id).await?;
    Ok((StatusCode::OK, Json(UnreadCount { unread })))
}

pub async fn mark_read(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Path(notification_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .mark_notification_read(user.id, notification_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_read(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
) -> Result<(StatusCode, Json<MarkedRead>), ServerError> {
    let updated = state.engine.mark_all_notifications_read(user.id).await?;
    Ok((StatusCode::OK, Json(MarkedRead { updated })))
}

pub async fn remove(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Path(notification_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_notification(user.id, notification_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
