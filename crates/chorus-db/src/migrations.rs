use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            first_name  TEXT,
            last_name   TEXT,
            bio         TEXT,
            location    TEXT,
            avatar_url  TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS friend_requests (
            id            TEXT PRIMARY KEY,
            sender_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            recipient_id  TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            status        TEXT NOT NULL DEFAULT 'PENDING'
                          CHECK (status IN ('PENDING', 'ACCEPTED')),
            created_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- At most one PENDING request per unordered pair, either direction.
        CREATE UNIQUE INDEX IF NOT EXISTS idx_friend_requests_pending_pair
            ON friend_requests (min(sender_id, recipient_id), max(sender_id, recipient_id))
            WHERE status = 'PENDING';

        -- The pair is stored canonically ordered (user_lo < user_hi), so the
        -- UNIQUE constraint makes the undirected edge symmetric-unique.
        CREATE TABLE IF NOT EXISTS friendships (
            id          TEXT PRIMARY KEY,
            user_lo     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            user_hi     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_lo, user_hi),
            CHECK (user_lo < user_hi)
        );

        CREATE TABLE IF NOT EXISTS posts (
            id          TEXT PRIMARY KEY,
            author_id   TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            content     TEXT NOT NULL,
            published   INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_posts_author
            ON posts(author_id, created_at);

        CREATE TABLE IF NOT EXISTS comments (
            id          TEXT PRIMARY KEY,
            post_id     TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            author_id   TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            body        TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_comments_post
            ON comments(post_id, created_at);

        CREATE TABLE IF NOT EXISTS likes (
            id          TEXT PRIMARY KEY,
            post_id     TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(post_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS votes (
            id          TEXT PRIMARY KEY,
            comment_id  TEXT NOT NULL REFERENCES comments(id) ON DELETE CASCADE,
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            kind        TEXT NOT NULL CHECK (kind IN ('UP', 'DOWN')),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(comment_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS tags (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL UNIQUE,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS post_tags (
            post_id     TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            tag_id      TEXT NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
            PRIMARY KEY (post_id, tag_id)
        );

        CREATE TABLE IF NOT EXISTS notifications (
            id               TEXT PRIMARY KEY,
            kind             TEXT NOT NULL
                             CHECK (kind IN ('COMMENT', 'LIKE', 'VOTE', 'FRIEND_REQUEST')),
            recipient_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            trigger_user_id  TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            post_id          TEXT REFERENCES posts(id) ON DELETE CASCADE,
            comment_id       TEXT REFERENCES comments(id) ON DELETE CASCADE,
            read             INTEGER NOT NULL DEFAULT 0,
            created_at       TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_notifications_recipient
            ON notifications(recipient_id, created_at);

        CREATE TABLE IF NOT EXISTS playlists (
            id           TEXT PRIMARY KEY,
            owner_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            url          TEXT NOT NULL,
            provider     TEXT NOT NULL CHECK (provider IN ('youtube', 'applemusic', 'spotify')),
            title        TEXT,
            description  TEXT,
            embed_code   TEXT NOT NULL,
            created_at   TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_playlists_owner
            ON playlists(owner_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
