//! Personal feed: the caller's posts and their friends' posts, newest
//! first, topped up with the most-liked posts from the rest of the
//! network.

use std::collections::HashSet;

use axum::{Extension, Json, extract::State, response::IntoResponse};

use chorus_types::api::Claims;

use crate::error::ApiError;
use crate::posts::{posts_with_tags, run_blocking};
use crate::state::AppState;

const TRENDING_LIMIT: u32 = 10;

pub async fn get_feed(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let user_id = claims.sub.to_string();

    let posts = run_blocking(move || {
        let mut rows = db.db.feed_posts(&user_id)?;

        let seen: HashSet<String> = rows.iter().map(|r| r.id.clone()).collect();
        for ranked in db.db.trending_posts(TRENDING_LIMIT)? {
            if !seen.contains(&ranked.post.id) {
                rows.push(ranked.post);
            }
        }

        // Newest first across both sections.
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        posts_with_tags(&db.db, rows)
    })
    .await?;

    Ok(Json(posts))
}
