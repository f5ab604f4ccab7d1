use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use chorus_api::middleware::require_auth;
use chorus_api::state::{AppState, AppStateInner};
use chorus_api::{
    auth, comments, embed, feed, friends, likes, notifications, playlists, posts, search, tags,
    votes,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chorus=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("CHORUS_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("CHORUS_DB_PATH").unwrap_or_else(|_| "chorus.db".into());
    let host = std::env::var("CHORUS_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("CHORUS_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = chorus_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state, injected into every handler
    let state: AppState = AppStateInner::new(db, jwt_secret);

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Chorus server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    // Read-only endpoints, open to anonymous callers
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/api/posts", get(posts::list_posts))
        .route("/api/posts/{id}", get(posts::get_post))
        .route("/api/posts/user/{user_id}", get(posts::list_posts_by_user))
        .route("/api/comments/post/{post_id}", get(comments::list_comments_for_post))
        .route("/api/likes/post/{post_id}", get(likes::list_likes_for_post))
        .route("/api/votes/comment/{comment_id}", get(votes::list_votes_for_comment))
        .route("/api/tags", get(tags::list_tags))
        .route("/api/tags/{id}", get(tags::get_tag))
        .route("/api/search/users/{term}", get(search::search_users))
        .route("/api/search/posts/{term}", get(search::search_posts))
        .route("/api/playlists/{id}", get(playlists::get_playlist))
        .route("/api/playlists/user/{user_id}", get(playlists::list_playlists_by_user))
        .route("/api/playlists/browse/{category}", get(playlists::browse_playlists))
        .with_state(state.clone());

    // Everything that writes, or is scoped to the caller, requires a token
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me).put(auth::update_me).delete(auth::delete_me))
        .route("/api/posts", post(posts::create_post))
        .route("/api/posts/{id}", put(posts::update_post).delete(posts::delete_post))
        .route("/api/comments", post(comments::create_comment))
        .route("/api/comments/{id}", delete(comments::delete_comment))
        .route("/api/likes", post(likes::create_like))
        .route("/api/likes/post/{post_id}", delete(likes::delete_like))
        .route("/api/votes", post(votes::create_vote))
        .route("/api/votes/{id}", delete(votes::delete_vote))
        .route("/api/tags", post(tags::create_tag))
        .route("/api/tags/{id}", delete(tags::delete_tag))
        .route(
            "/api/friends/requests",
            post(friends::send_request).get(friends::list_incoming_requests),
        )
        .route("/api/friends/requests/{id}/accept", post(friends::accept_request))
        .route("/api/friends/requests/{id}", delete(friends::decline_request))
        .route("/api/friends", get(friends::list_friends))
        .route("/api/friends/{user_id}", delete(friends::remove_friend))
        .route("/api/notifications", get(notifications::list_notifications))
        .route("/api/notifications/read-all", put(notifications::mark_all_read))
        .route("/api/notifications/{id}/read", put(notifications::mark_read))
        .route("/api/notifications/{id}", delete(notifications::delete_notification))
        .route("/api/playlists", post(playlists::create_playlist))
        .route(
            "/api/playlists/{id}",
            put(playlists::update_playlist).delete(playlists::delete_playlist),
        )
        .route("/api/embeds", post(embed::convert_url))
        .route("/api/feed", get(feed::get_feed))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
