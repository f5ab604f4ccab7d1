use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use chorus_db::NewNotification;
use chorus_db::models::CommentRow;
use chorus_types::api::{Claims, CommentResponse, CreateCommentRequest};
use chorus_types::models::NotificationKind;

use crate::error::ApiError;
use crate::state::AppState;
use crate::{parse_id, parse_timestamp};

fn comment_to_response(row: CommentRow) -> CommentResponse {
    CommentResponse {
        id: parse_id(&row.id),
        post_id: parse_id(&row.post_id),
        author_id: parse_id(&row.author_id),
        author_username: row.author_username,
        body: row.body,
        created_at: parse_timestamp(&row.created_at),
    }
}

pub async fn list_comments_for_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_comments_for_post(&post_id.to_string())?;
    let comments: Vec<CommentResponse> = rows.into_iter().map(comment_to_response).collect();
    Ok(Json(comments))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.body.trim().is_empty() {
        return Err(ApiError::validation("comment body must not be empty"));
    }

    let post = state
        .db
        .get_post(&req.post_id.to_string())?
        .ok_or_else(|| ApiError::not_found("post"))?;

    let comment_id = Uuid::new_v4();
    state.db.insert_comment(
        &comment_id.to_string(),
        &req.post_id.to_string(),
        &claims.sub.to_string(),
        &req.body,
    )?;

    // Tell the post's author, unless they commented on their own post.
    if post.author_id != claims.sub.to_string() {
        state.db.insert_notification(&NewNotification {
            id: &Uuid::new_v4().to_string(),
            kind: NotificationKind::Comment.as_str(),
            recipient_id: &post.author_id,
            trigger_user_id: &claims.sub.to_string(),
            post_id: Some(&req.post_id.to_string()),
            comment_id: Some(&comment_id.to_string()),
        })?;
    }

    // Respond with the stored row so the timestamp matches later reads.
    let row = state
        .db
        .get_comment(&comment_id.to_string())?
        .ok_or_else(|| ApiError::not_found("comment"))?;

    Ok((StatusCode::CREATED, Json(comment_to_response(row))))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_comment(&comment_id.to_string())?
        .ok_or_else(|| ApiError::not_found("comment"))?;

    if row.author_id != claims.sub.to_string() {
        return Err(ApiError::forbidden("only the author can delete this comment"));
    }

    state.db.delete_comment(&comment_id.to_string())?;

    Ok(Json(serde_json::json!({ "message": "comment deleted" })))
}
