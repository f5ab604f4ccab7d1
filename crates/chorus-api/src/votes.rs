use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use chorus_db::{DbError, NewNotification};
use chorus_db::models::VoteRow;
use chorus_types::api::{Claims, CreateVoteRequest, VoteResponse};
use chorus_types::models::{NotificationKind, VoteKind};

use crate::error::ApiError;
use crate::state::AppState;
use crate::{parse_id, parse_timestamp};

fn vote_to_response(row: VoteRow) -> VoteResponse {
    VoteResponse {
        id: parse_id(&row.id),
        comment_id: parse_id(&row.comment_id),
        user_id: parse_id(&row.user_id),
        kind: VoteKind::parse(&row.kind).unwrap_or(VoteKind::Up),
        created_at: parse_timestamp(&row.created_at),
    }
}

pub async fn list_votes_for_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_votes_for_comment(&comment_id.to_string())?;
    let votes: Vec<VoteResponse> = rows.into_iter().map(vote_to_response).collect();
    Ok(Json(votes))
}

pub async fn create_vote(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateVoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state
        .db
        .get_comment(&req.comment_id.to_string())?
        .ok_or_else(|| ApiError::not_found("comment"))?;

    let vote_id = Uuid::new_v4();
    state
        .db
        .insert_vote(
            &vote_id.to_string(),
            &req.comment_id.to_string(),
            &claims.sub.to_string(),
            req.kind.as_str(),
        )
        .map_err(|e| match e {
            DbError::Conflict => ApiError::conflict("you already voted on this comment"),
            other => other.into(),
        })?;

    if comment.author_id != claims.sub.to_string() {
        state.db.insert_notification(&NewNotification {
            id: &Uuid::new_v4().to_string(),
            kind: NotificationKind::Vote.as_str(),
            recipient_id: &comment.author_id,
            trigger_user_id: &claims.sub.to_string(),
            post_id: Some(&comment.post_id),
            comment_id: Some(&req.comment_id.to_string()),
        })?;
    }

    // Respond with the stored row so the timestamp matches later reads.
    let row = state
        .db
        .get_vote(&vote_id.to_string())?
        .ok_or_else(|| ApiError::not_found("vote"))?;

    Ok((StatusCode::CREATED, Json(vote_to_response(row))))
}

pub async fn delete_vote(
    State(state): State<AppState>,
    Path(vote_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_vote(&vote_id.to_string())?
        .ok_or_else(|| ApiError::not_found("vote"))?;

    if row.user_id != claims.sub.to_string() {
        return Err(ApiError::forbidden("only the voter can remove this vote"));
    }

    state.db.delete_vote(&vote_id.to_string())?;

    Ok(Json(serde_json::json!({ "message": "vote removed" })))
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
        let comment = Uuid::new_v4();
        db.insert_comment(
            &comment.to_string(),
            &post.to_string(),
            &alice.to_string(),
            "first",
        )
        .unwrap();
        (
            AppStateInner::new(db, "test-secret".into()),
            alice,
            bob,
            comment,
        )
    }

    fn claims(sub: Uuid, username: &str) -> Claims {
        Claims {
            sub,
            username: username.into(),
            exp: usize::MAX,
        }
    }

    #[tokio::test]
    async fn second_vote_by_same_user_conflicts() {
        let (state, _alice, bob, comment) = seeded_state();

        create_vote(
            State(state.clone()),
            Extension(claims(bob, "bob")),
            Json(CreateVoteRequest {
                comment_id: comment,
                kind: VoteKind::Up,
            }),
        )
        .await
        .unwrap();

        let result = create_vote(
            State(state),
            Extension(claims(bob, "bob")),
            Json(CreateVoteRequest {
                comment_id: comment,
                kind: VoteKind::Down,
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Conflict(_))));
    }

    #[tokio::test]
    async fn vote_notifies_comment_author() {
        let (state, alice, bob, comment) = seeded_state();

        create_vote(
            State(state.clone()),
            Extension(claims(bob, "bob")),
            Json(CreateVoteRequest {
                comment_id: comment,
                kind: VoteKind::Up,
            }),
        )
        .await
        .unwrap();

        let inbox = state
            .db
            .list_notifications_for_user(&alice.to_string())
            .unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, "VOTE");
    }

    #[tokio::test]
    async fn only_the_voter_can_remove_a_vote() {
        let (state, alice, bob, comment) = seeded_state();

        let vote_id = Uuid::new_v4();
        state
            .db
            .insert_vote(
                &vote_id.to_string(),
                &comment.to_string(),
                &bob.to_string(),
                "UP",
            )
            .unwrap();

        let result = delete_vote(
            State(state.clone()),
            Path(vote_id),
            Extension(claims(alice, "alice")),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));

        delete_vote(State(state), Path(vote_id), Extension(claims(bob, "bob")))
            .await
            .unwrap();
    }
}
