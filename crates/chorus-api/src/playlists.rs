use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use chorus_db::NewPlaylist;
use chorus_db::models::PlaylistRow;
use chorus_types::api::{
    Claims, CreatePlaylistRequest, PlaylistResponse, UpdatePlaylistRequest,
};
use chorus_types::models::PlaylistProvider;

use crate::embed;
use crate::error::ApiError;
use crate::state::AppState;
use crate::{parse_id, parse_timestamp};

fn playlist_to_response(row: PlaylistRow) -> PlaylistResponse {
    PlaylistResponse {
        id: parse_id(&row.id),
        owner_id: parse_id(&row.owner_id),
        owner_username: row.owner_username,
        url: row.url,
        provider: PlaylistProvider::parse(&row.provider).unwrap_or(PlaylistProvider::Spotify),
        title: row.title,
        description: row.description,
        embed_code: row.embed_code,
        created_at: parse_timestamp(&row.created_at),
    }
}

pub async fn create_playlist(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePlaylistRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (provider, embed_code) = embed::build_embed(&req.url)
        .ok_or_else(|| ApiError::validation("unsupported playlist URL"))?;

    let playlist_id = Uuid::new_v4();
    state.db.insert_playlist(&NewPlaylist {
        id: &playlist_id.to_string(),
        owner_id: &claims.sub.to_string(),
        url: &req.url,
        provider: provider.as_str(),
        title: req.title.as_deref(),
        description: req.description.as_deref(),
        embed_code: &embed_code,
    })?;

    // Respond with the stored row so the timestamp matches later reads.
    let row = state
        .db
        .get_playlist(&playlist_id.to_string())?
        .ok_or_else(|| ApiError::not_found("playlist"))?;

    Ok((StatusCode::CREATED, Json(playlist_to_response(row))))
}

pub async fn get_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_playlist(&playlist_id.to_string())?
        .ok_or_else(|| ApiError::not_found("playlist"))?;

    Ok(Json(playlist_to_response(row)))
}

pub async fn list_playlists_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_playlists_by_owner(&user_id.to_string())?;
    let playlists: Vec<PlaylistResponse> =
        rows.into_iter().map(playlist_to_response).collect();
    Ok(Json(playlists))
}

/// Browse by category: `new` for the latest additions, or a provider name.
pub async fn browse_playlists(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = match category.as_str() {
        "new" => state.db.list_newest_playlists(10)?,
        other => match PlaylistProvider::parse(other) {
            Some(provider) => state.db.list_playlists_by_provider(provider.as_str())?,
            None => return Err(ApiError::validation("invalid playlist category")),
        },
    };

    let playlists: Vec<PlaylistResponse> =
        rows.into_iter().map(playlist_to_response).collect();
    Ok(Json(playlists))
}

pub async fn update_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdatePlaylistRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_playlist(&playlist_id.to_string())?
        .ok_or_else(|| ApiError::not_found("playlist"))?;

    if row.owner_id != claims.sub.to_string() {
        return Err(ApiError::forbidden("only the owner can edit this playlist"));
    }

    state.db.update_playlist(
        &playlist_id.to_string(),
        req.title.as_deref(),
        req.description.as_deref(),
    )?;

    let row = state
        .db
        .get_playlist(&playlist_id.to_string())?
        .ok_or_else(|| ApiError::not_found("playlist"))?;

    Ok(Json(playlist_to_response(row)))
}

pub async fn delete_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_playlist(&playlist_id.to_string())?
        .ok_or_else(|| ApiError::not_found("playlist"))?;

    if row.owner_id != claims.sub.to_string() {
        return Err(ApiError::forbidden("only the owner can delete this playlist"));
    }

    state.db.delete_playlist(&playlist_id.to_string())?;

    Ok(Json(serde_json::json!({ "message": "playlist deleted" })))
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
    async fn spotify_playlist_gets_rewritten_embed() {
        let alice = Uuid::new_v4();
        let state = state_with_user(alice, "alice");

        create_playlist(
            State(state.clone()),
            Extension(claims(alice, "alice")),
            Json(CreatePlaylistRequest {
                url: "https://open.spotify.com/playlist/abc123".into(),
                title: Some("road trip".into()),
                description: None,
            }),
        )
        .await
        .unwrap();

        let rows = state
            .db
            .list_playlists_by_owner(&alice.to_string())
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].provider, "spotify");
        assert!(rows[0].embed_code.contains("abc123"));
    }

    #[tokio::test]
    async fn unsupported_url_is_rejected() {
        let alice = Uuid::new_v4();
        let state = state_with_user(alice, "alice");

        let result = create_playlist(
            State(state),
            Extension(claims(alice, "alice")),
            Json(CreatePlaylistRequest {
                url: "https://bandcamp.com/some-album".into(),
                title: None,
                description: None,
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn browse_rejects_unknown_category() {
        let alice = Uuid::new_v4();
        let state = state_with_user(alice, "alice");

        let result = browse_playlists(State(state), Path("vinyl".into())).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn only_owner_edits() {
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

        let playlist_id = Uuid::new_v4();
        state
            .db
            .insert_playlist(&NewPlaylist {
                id: &playlist_id.to_string(),
                owner_id: &alice.to_string(),
                url: "https://open.spotify.com/playlist/abc",
                provider: "spotify",
                title: None,
                description: None,
                embed_code: "<iframe></iframe>",
            })
            .unwrap();

        let result = update_playlist(
            State(state),
            Path(playlist_id),
            Extension(claims(mallory, "mallory")),
            Json(UpdatePlaylistRequest {
                title: Some("stolen".into()),
                description: None,
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }
}
