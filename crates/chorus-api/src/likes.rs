use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use chorus_db::models::LikeRow;
use chorus_db::{DbError, NewNotification};
use chorus_types::api::{Claims, CreateLikeRequest, LikeResponse};
use chorus_types::models::NotificationKind;

use crate::error::ApiError;
use crate::state::AppState;
use crate::{parse_id, parse_timestamp};

fn like_to_response(row: LikeRow) -> LikeResponse {
    LikeResponse {
        id: parse_id(&row.id),
        post_id: parse_id(&row.post_id),
        user_id: parse_id(&row.user_id),
        created_at: parse_timestamp(&row.created_at),
    }
}

pub async fn list_likes_for_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_likes_for_post(&post_id.to_string())?;
    let likes: Vec<LikeResponse> = rows.into_iter().map(like_to_response).collect();
    Ok(Json(likes))
}

pub async fn create_like(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateLikeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .db
        .get_post(&req.post_id.to_string())?
        .ok_or_else(|| ApiError::not_found("post"))?;

    let like_id = Uuid::new_v4();
    state
        .db
        .insert_like(&like_id.to_string(), &req.post_id.to_string(), &claims.sub.to_string())
        .map_err(|e| match e {
            DbError::Conflict => ApiError::conflict("you already liked this post"),
            other => other.into(),
        })?;

    if post.author_id != claims.sub.to_string() {
        state.db.insert_notification(&NewNotification {
            id: &Uuid::new_v4().to_string(),
            kind: NotificationKind::Like.as_str(),
            recipient_id: &post.author_id,
            trigger_user_id: &claims.sub.to_string(),
            post_id: Some(&req.post_id.to_string()),
            comment_id: None,
        })?;
    }

    // Respond with the stored row so the timestamp matches later reads.
    let row = state
        .db
        .get_like(&like_id.to_string())?
        .ok_or_else(|| ApiError::not_found("like"))?;

    Ok((StatusCode::CREATED, Json(like_to_response(row))))
}

/// Remove the caller's own like on a post.
pub async fn delete_like(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .delete_like(&post_id.to_string(), &claims.sub.to_string())
        .map_err(|e| match e {
            DbError::NotFound => ApiError::not_found("like"),
            other => other.into(),
        })?;

    Ok(Json(serde_json::json!({ "message": "like removed" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppStateInner;
    use chorus_db::{Database, NewUser};

    fn seeded_state() -> (AppState, Uuid, Uuid, Uuid) {
        let db = Database::open_in_memory().unwrap();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        for (id, name) in [(alice, "alice"), (bob, "bob")] {
            db.create_user(&NewUser {
                id: &id.to_string(),
                username: name,
                email: &format!("{name}@example.com"),
                password_hash: "hash",
                first_name: None,
                last_name: None,
            })
            .unwrap();
        }
        let post = Uuid::new_v4();
        db.create_post(&post.to_string(), &alice.to_string(), "hi", true, &[])
            .unwrap();
        (AppStateInner::new(db, "test-secret".into()), alice, bob, post)
    }

    fn claims(sub: Uuid, username: &str) -> Claims {
        Claims {
            sub,
            username: username.into(),
            exp: usize::MAX,
        }
    }

    #[tokio::test]
    async fn double_like_conflicts() {
        let (state, _alice, bob, post) = seeded_state();

        create_like(
            State(state.clone()),
            Extension(claims(bob, "bob")),
            Json(CreateLikeRequest { post_id: post }),
        )
        .await
        .unwrap();

        let result = create_like(
            State(state),
            Extension(claims(bob, "bob")),
            Json(CreateLikeRequest { post_id: post }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Conflict(_))));
    }

    #[tokio::test]
    async fn like_notifies_post_author() {
        let (state, alice, bob, post) = seeded_state();

        create_like(
            State(state.clone()),
            Extension(claims(bob, "bob")),
            Json(CreateLikeRequest { post_id: post }),
        )
        .await
        .unwrap();

        let inbox = state
            .db
            .list_notifications_for_user(&alice.to_string())
            .unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, "LIKE");
    }

    #[tokio::test]
    async fn creation_response_matches_stored_row() {
        let (state, _alice, bob, post) = seeded_state();

        let resp = create_like(
            State(state.clone()),
            Extension(claims(bob, "bob")),
            Json(CreateLikeRequest { post_id: post }),
        )
        .await
        .unwrap()
        .into_response();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        let row = state
            .db
            .get_like(body["id"].as_str().unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(
            body["created_at"],
            serde_json::to_value(crate::parse_timestamp(&row.created_at)).unwrap()
        );
    }

    #[tokio::test]
    async fn unlike_without_like_is_not_found() {
        let (state, _alice, bob, post) = seeded_state();

        let result = delete_like(State(state), Path(post), Extension(claims(bob, "bob"))).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
