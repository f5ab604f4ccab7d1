//! Playlist URL classification and embed-markup generation.
//!
//! Classification is by substring match against known hosting domains;
//! anything unrecognized is a validation error at the API surface.

use axum::{Json, response::IntoResponse};

use chorus_types::api::{ConvertUrlRequest, EmbedResponse};
use chorus_types::models::PlaylistProvider;

use crate::error::ApiError;

pub fn classify(url: &str) -> Option<PlaylistProvider> {
    if url.contains("youtube.com") || url.contains("youtu.be") {
        Some(PlaylistProvider::YouTube)
    } else if url.contains("music.apple.com") {
        Some(PlaylistProvider::AppleMusic)
    } else if url.contains("open.spotify.com/playlist") {
        Some(PlaylistProvider::Spotify)
    } else {
        None
    }
}

pub fn embed_markup(provider: PlaylistProvider, url: &str) -> String {
    match provider {
        PlaylistProvider::YouTube => format!(
            r#"<iframe width="560" height="315" src="{url}" frameborder="0" allowfullscreen></iframe>"#
        ),
        PlaylistProvider::AppleMusic => format!(
            r#"<iframe src="{url}" width="100%" height="450" frameborder="0" allowtransparency="true" allow="encrypted-media"></iframe>"#
        ),
        PlaylistProvider::Spotify => {
            let id = spotify_playlist_id(url);
            format!(
                r#"<iframe src="https://open.spotify.com/embed/playlist/{id}" width="300" height="380" frameborder="0" allowtransparency="true" allow="encrypted-media"></iframe>"#
            )
        }
    }
}

/// Classify and render in one step; `None` means the domain is unsupported.
pub fn build_embed(url: &str) -> Option<(PlaylistProvider, String)> {
    let provider = classify(url)?;
    Some((provider, embed_markup(provider, url)))
}

/// The playlist ID is the last path segment of the share URL.
fn spotify_playlist_id(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// Stateless URL-to-embed conversion, no persistence.
pub async fn convert_url(
    Json(req): Json<ConvertUrlRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (provider, embed_code) = build_embed(&req.url)
        .ok_or_else(|| ApiError::validation("unsupported playlist URL"))?;

    Ok(Json(EmbedResponse {
        provider,
        embed_code,
    }))
}
