use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use chorus_types::api::UserResponse;

use crate::auth::user_to_response;
use crate::error::ApiError;
use crate::posts::{posts_with_tags, run_blocking};
use crate::state::AppState;

/// Substring search over username and name fields.
pub async fn search_users(
    State(state): State<AppState>,
    Path(term): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let term = term.trim().to_string();
    if term.is_empty() {
        return Err(ApiError::validation("search term must not be empty"));
    }

    let rows = state.db.search_users(&term)?;
    let users: Vec<UserResponse> = rows.into_iter().map(user_to_response).collect();
    Ok(Json(users))
}

/// Substring search over post content, tags included in the result.
pub async fn search_posts(
    State(state): State<AppState>,
    Path(term): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let term = term.trim().to_string();
    if term.is_empty() {
        return Err(ApiError::validation("search term must not be empty"));
    }

    let db = state.clone();
    let posts = run_blocking(move || {
        let rows = db.db.search_posts(&term)?;
        posts_with_tags(&db.db, rows)
    })
    .await?;

    Ok(Json(posts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppStateInner;
    use chorus_db::{Database, NewUser};

    #[tokio::test]
    async fn blank_term_is_rejected() {
        let state = AppStateInner::new(Database::open_in_memory().unwrap(), "s".into());
        let result = search_users(State(state), Path("   ".into())).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn post_search_returns_tagged_results() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&NewUser {
            id: "u1",
            username: "alice",
            email: "alice@example.com",
            password_hash: "hash",
            first_name: None,
            last_name: None,
        })
        .unwrap();
        db.create_post("p1", "u1", "late night synthwave", true, &["synth".into()])
            .unwrap();
        let state = AppStateInner::new(db, "s".into());

        // Goes through the same row->response path as the public handler.
        let rows = state.db.search_posts("synthwave").unwrap();
        let posts = posts_with_tags(&state.db, rows).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].tags, vec!["synth"]);
    }
}
