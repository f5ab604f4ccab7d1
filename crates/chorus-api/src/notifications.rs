use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use chorus_db::models::NotificationRow;
use chorus_types::api::{Claims, MarkAllReadResponse, NotificationResponse};
use chorus_types::models::NotificationKind;

use crate::error::ApiError;
use crate::state::AppState;
use crate::{parse_id, parse_timestamp};

fn notification_to_response(row: NotificationRow) -> NotificationResponse {
    NotificationResponse {
        id: parse_id(&row.id),
        kind: NotificationKind::parse(&row.kind).unwrap_or(NotificationKind::Comment),
        trigger_user_id: parse_id(&row.trigger_user_id),
        trigger_username: row.trigger_username,
        post_id: row.post_id.as_deref().map(parse_id),
        comment_id: row.comment_id.as_deref().map(parse_id),
        read: row.read,
        created_at: parse_timestamp(&row.created_at),
    }
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_notifications_for_user(&claims.sub.to_string())?;
    let notifications: Vec<NotificationResponse> =
        rows.into_iter().map(notification_to_response).collect();
    Ok(Json(notifications))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_notification(&notification_id.to_string())?
        .ok_or_else(|| ApiError::not_found("notification"))?;

    if row.recipient_id != claims.sub.to_string() {
        return Err(ApiError::forbidden(
            "you can only update your own notifications",
        ));
    }

    state.db.mark_notification_read(&notification_id.to_string())?;

    Ok(Json(serde_json::json!({ "message": "notification marked as read" })))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .db
        .mark_all_notifications_read(&claims.sub.to_string())?;

    Ok(Json(MarkAllReadResponse { updated }))
}

pub async fn delete_notification(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_notification(&notification_id.to_string())?
        .ok_or_else(|| ApiError::not_found("notification"))?;

    if row.recipient_id != claims.sub.to_string() {
        return Err(ApiError::forbidden(
            "you can only delete your own notifications",
        ));
    }

    state.db.delete_notification(&notification_id.to_string())?;

    Ok(Json(serde_json::json!({ "message": "notification deleted" })))
}
