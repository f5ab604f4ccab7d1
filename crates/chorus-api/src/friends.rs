//! HTTP surface of the friendship workflow: request, accept, decline,
//! list, and unfriend. Only the recipient of a request may resolve it.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use chorus_db::DbError;
use chorus_db::models::FriendRequestRow;
use chorus_types::api::{Claims, FriendRequestResponse, FriendResponse, SendFriendRequestRequest};
use chorus_types::models::RequestStatus;

use crate::error::ApiError;
use crate::state::AppState;
use crate::{parse_id, parse_timestamp};

fn request_to_response(row: FriendRequestRow) -> FriendRequestResponse {
    FriendRequestResponse {
        id: parse_id(&row.id),
        sender_id: parse_id(&row.sender_id),
        sender_username: row.sender_username,
        recipient_id: parse_id(&row.recipient_id),
        status: RequestStatus::parse(&row.status).unwrap_or(RequestStatus::Pending),
        created_at: parse_timestamp(&row.created_at),
    }
}

pub async fn send_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendFriendRequestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.recipient_id == claims.sub {
        return Err(ApiError::validation(
            "cannot send a friend request to yourself",
        ));
    }
    if state
        .db
        .get_user_by_id(&req.recipient_id.to_string())?
        .is_none()
    {
        return Err(ApiError::validation("recipient does not exist"));
    }

    let request_id = Uuid::new_v4();
    state
        .db
        .send_friend_request(
            &request_id.to_string(),
            &claims.sub.to_string(),
            &req.recipient_id.to_string(),
            &Uuid::new_v4().to_string(),
        )
        .map_err(|e| match e {
            DbError::Conflict => {
                ApiError::conflict("a friendship or pending request already exists")
            }
            other => other.into(),
        })?;

    // Respond with the stored row so the timestamp matches later reads.
    let row = state
        .db
        .get_friend_request(&request_id.to_string())?
        .ok_or_else(|| ApiError::not_found("friend request"))?;

    Ok((StatusCode::CREATED, Json(request_to_response(row))))
}

/// Pending requests addressed to the caller.
pub async fn list_incoming_requests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_incoming_requests(&claims.sub.to_string())?;
    let requests: Vec<FriendRequestResponse> =
        rows.into_iter().map(request_to_response).collect();
    Ok(Json(requests))
}

pub async fn accept_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_friend_request(&request_id.to_string())?
        .ok_or_else(|| ApiError::not_found("friend request"))?;

    if row.recipient_id != claims.sub.to_string() {
        return Err(ApiError::forbidden(
            "only the recipient can accept this request",
        ));
    }
    if row.status != RequestStatus::Pending.as_str() {
        return Err(ApiError::conflict("friend request already resolved"));
    }

    state
        .db
        .accept_friend_request(&request_id.to_string(), &Uuid::new_v4().to_string())
        .map_err(|e| match e {
            // Lost a race with a concurrent resolve.
            DbError::NotFound => ApiError::conflict("friend request already resolved"),
            other => other.into(),
        })?;

    Ok(Json(serde_json::json!({ "message": "friend request accepted" })))
}

pub async fn decline_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_friend_request(&request_id.to_string())?
        .ok_or_else(|| ApiError::not_found("friend request"))?;

    if row.recipient_id != claims.sub.to_string() {
        return Err(ApiError::forbidden(
            "only the recipient can decline this request",
        ));
    }

    state
        .db
        .decline_friend_request(&request_id.to_string())
        .map_err(|e| match e {
            DbError::NotFound => ApiError::conflict("friend request already resolved"),
            other => other.into(),
        })?;

    Ok(Json(serde_json::json!({ "message": "friend request declined" })))
}

pub async fn list_friends(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_friends(&claims.sub.to_string())?;

    let friends: Vec<FriendResponse> = rows
        .into_iter()
        .map(|row| FriendResponse {
            user_id: parse_id(&row.user_id),
            username: row.username,
            avatar_url: row.avatar_url,
            friends_since: parse_timestamp(&row.friends_since),
        })
        .collect();

    Ok(Json(friends))
}

pub async fn remove_friend(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .remove_friend(&claims.sub.to_string(), &user_id.to_string())
        .map_err(|e| match e {
            DbError::NotFound => ApiError::not_found("friendship"),
            other => other.into(),
        })?;

    Ok(Json(serde_json::json!({ "message": "friend removed" })))
}
