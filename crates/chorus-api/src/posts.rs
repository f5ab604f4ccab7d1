use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;
use uuid::Uuid;

use chorus_db::Database;
use chorus_db::models::PostRow;
use chorus_types::api::{Claims, CreatePostRequest, PostResponse, UpdatePostRequest};

use crate::error::ApiError;
use crate::state::AppState;
use crate::{parse_id, parse_timestamp};

/// Attach tag names to post rows in one batch query (no N+1).
pub(crate) fn posts_with_tags(
    db: &Database,
    rows: Vec<PostRow>,
) -> Result<Vec<PostResponse>, chorus_db::DbError> {
    let post_ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let links = db.get_tags_for_posts(&post_ids)?;

    let mut tag_map: HashMap<String, Vec<String>> = HashMap::new();
    for link in links {
        tag_map.entry(link.post_id).or_default().push(link.tag_name);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let tags = tag_map.remove(&row.id).unwrap_or_default();
            post_to_response(row, tags)
        })
        .collect())
}

pub(crate) fn post_to_response(row: PostRow, tags: Vec<String>) -> PostResponse {
    PostResponse {
        id: parse_id(&row.id),
        author_id: parse_id(&row.author_id),
        author_username: row.author_username,
        content: row.content,
        published: row.published,
        created_at: parse_timestamp(&row.created_at),
        tags,
    }
}

pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, chorus_db::DbError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })?
        .map_err(ApiError::from)
}

pub async fn list_posts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let posts = run_blocking(move || {
        let rows = db.db.list_posts()?;
        posts_with_tags(&db.db, rows)
    })
    .await?;

    Ok(Json(posts))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_post(&post_id.to_string())?
        .ok_or_else(|| ApiError::not_found("post"))?;

    let mut posts = posts_with_tags(&state.db, vec![row])?;
    let post = posts.pop().ok_or_else(|| ApiError::not_found("post"))?;

    Ok(Json(post))
}

pub async fn list_posts_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let posts = run_blocking(move || {
        let rows = db.db.list_posts_by_author(&user_id.to_string())?;
        posts_with_tags(&db.db, rows)
    })
    .await?;

    Ok(Json(posts))
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.content.trim().is_empty() {
        return Err(ApiError::validation("post content must not be empty"));
    }

    let post_id = Uuid::new_v4();
    state.db.create_post(
        &post_id.to_string(),
        &claims.sub.to_string(),
        &req.content,
        req.published,
        &req.tags,
    )?;

    // Respond with the stored row so the timestamp matches later reads.
    let row = state
        .db
        .get_post(&post_id.to_string())?
        .ok_or_else(|| ApiError::not_found("post"))?;
    let mut posts = posts_with_tags(&state.db, vec![row])?;
    let post = posts.pop().ok_or_else(|| ApiError::not_found("post"))?;

    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_post(&post_id.to_string())?
        .ok_or_else(|| ApiError::not_found("post"))?;

    if row.author_id != claims.sub.to_string() {
        return Err(ApiError::forbidden("only the author can edit this post"));
    }

    state
        .db
        .update_post(&post_id.to_string(), req.content.as_deref(), req.published)?;

    let row = state
        .db
        .get_post(&post_id.to_string())?
        .ok_or_else(|| ApiError::not_found("post"))?;
    let mut posts = posts_with_tags(&state.db, vec![row])?;
    let post = posts.pop().ok_or_else(|| ApiError::not_found("post"))?;

    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_post(&post_id.to_string())?
        .ok_or_else(|| ApiError::not_found("post"))?;

    if row.author_id != claims.sub.to_string() {
        return Err(ApiError::forbidden("only the author can delete this post"));
    }

    state.db.delete_post(&post_id.to_string())?;

    Ok(Json(serde_json::json!({ "message": "post deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppStateInner;
    use chorus_db::{Database, NewUser};

    fn state_with_user(id: Uuid, username: &str) -> AppState {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&NewUser {
            id: &id.to_string(),
            username,
            email: &format!("{username}@example.com"),
            password_hash: "hash",
            first_name: None,
            last_name: None,
        })
        .unwrap();
        AppStateInner::new(db, "test-secret".into())
    }

    fn claims(sub: Uuid, username: &str) -> Claims {
        Claims {
            sub,
            username: username.into(),
            exp: usize::MAX,
        }
    }

    #[tokio::test]
    async fn create_and_fetch_with_tags() {
        let alice = Uuid::new_v4();
        let state = state_with_user(alice, "alice");

        create_post(
            State(state.clone()),
            Extension(claims(alice, "alice")),
            Json(CreatePostRequest {
                content: "hello".into(),
                published: true,
                tags: vec!["rock".into(), "jazz".into()],
            }),
        )
        .await
        .unwrap();

        let rows = state.db.list_posts().unwrap();
        assert_eq!(rows.len(), 1);
        let posts = posts_with_tags(&state.db, rows).unwrap();
        assert_eq!(posts[0].tags, vec!["jazz", "rock"]);
    }

    #[tokio::test]
    async fn creation_response_matches_stored_row() {
        let alice = Uuid::new_v4();
        let state = state_with_user(alice, "alice");

        let resp = create_post(
            State(state.clone()),
            Extension(claims(alice, "alice")),
            Json(CreatePostRequest {
                content: "hello".into(),
                published: true,
                tags: vec![],
            }),
        )
        .await
        .unwrap()
        .into_response();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        let row = &state.db.list_posts().unwrap()[0];
        assert_eq!(body["id"], row.id.as_str());
        // The body carries the stored timestamp, not a fresh one.
        assert_eq!(
            body["created_at"],
            serde_json::to_value(crate::parse_timestamp(&row.created_at)).unwrap()
        );
    }

    #[tokio::test]
    async fn only_author_can_delete() {
        let alice = Uuid::new_v4();
        let state = state_with_user(alice, "alice");
        let mallory = Uuid::new_v4();
        state
            .db
            .create_user(&NewUser {
                id: &mallory.to_string(),
                username: "mallory",
                email: "mallory@example.com",
                password_hash: "hash",
                first_name: None,
                last_name: None,
            })
            .unwrap();

        let post_id = Uuid::new_v4();
        state
            .db
            .create_post(&post_id.to_string(), &alice.to_string(), "mine", true, &[])
            .unwrap();

        let result = delete_post(
            State(state.clone()),
            Path(post_id),
            Extension(claims(mallory, "mallory")),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));

        delete_post(State(state), Path(post_id), Extension(claims(alice, "alice")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn empty_content_is_rejected() {
        let alice = Uuid::new_v4();
        let state = state_with_user(alice, "alice");

        let result = create_post(
            State(state),
            Extension(claims(alice, "alice")),
            Json(CreatePostRequest {
                content: "   ".into(),
                published: true,
                tags: vec![],
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }
}
