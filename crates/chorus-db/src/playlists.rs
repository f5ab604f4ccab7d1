use rusqlite::{Connection, OptionalExtension};

use crate::models::PlaylistRow;
use crate::{Database, DbError, Result};

const PLAYLIST_SELECT: &str = "SELECT p.id, p.owner_id, u.username, p.url, p.provider, p.title,
            p.description, p.embed_code, p.created_at
     FROM playlists p
     JOIN users u ON u.id = p.owner_id";

pub struct NewPlaylist<'a> {
    pub id: &'a str,
    pub owner_id: &'a str,
    pub url: &'a str,
    pub provider: &'a str,
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub embed_code: &'a str,
}

impl Database {
    pub fn insert_playlist(&self, p: &NewPlaylist) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO playlists (id, owner_id, url, provider, title, description, embed_code)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    p.id,
                    p.owner_id,
                    p.url,
                    p.provider,
                    p.title,
                    p.description,
                    p.embed_code
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_playlist(&self, id: &str) -> Result<Option<PlaylistRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("{PLAYLIST_SELECT} WHERE p.id = ?1"),
                    [id],
                    playlist_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn list_playlists_by_owner(&self, owner_id: &str) -> Result<Vec<PlaylistRow>> {
        self.with_conn(|conn| {
            query_playlists(
                conn,
                &format!("{PLAYLIST_SELECT} WHERE p.owner_id = ?1 ORDER BY p.created_at DESC, p.id"),
                [owner_id],
            )
        })
    }

    /// Latest additions across all users.
    pub fn list_newest_playlists(&self, limit: u32) -> Result<Vec<PlaylistRow>> {
        self.with_conn(|conn| {
            query_playlists(
                conn,
                &format!("{PLAYLIST_SELECT} ORDER BY p.created_at DESC, p.id LIMIT ?1"),
                [limit],
            )
        })
    }

    pub fn list_playlists_by_provider(&self, provider: &str) -> Result<Vec<PlaylistRow>> {
        self.with_conn(|conn| {
            query_playlists(
                conn,
                &format!("{PLAYLIST_SELECT} WHERE p.provider = ?1 ORDER BY p.created_at DESC, p.id"),
                [provider],
            )
        })
    }

    pub fn update_playlist(
        &self,
        id: &str,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "UPDATE playlists SET
                     title = COALESCE(?2, title),
                     description = COALESCE(?3, description)
                 WHERE id = ?1",
                rusqlite::params![id, title, description],
            )?;
            if affected == 0 {
                return Err(DbError::NotFound);
            }
            Ok(())
        })
    }

    pub fn delete_playlist(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM playlists WHERE id = ?1", [id])?;
            if affected == 0 {
                return Err(DbError::NotFound);
            }
            Ok(())
        })
    }
}

fn query_playlists<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<PlaylistRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, playlist_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn playlist_from_row(row: &rusqlite::Row) -> std::result::Result<PlaylistRow, rusqlite::Error> {
    Ok(PlaylistRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        owner_username: row.get(2)?,
        url: row.get(3)?,
        provider: row.get(4)?,
        title: row.get(5)?,
        description: row.get(6)?,
        embed_code: row.get(7)?,
        created_at: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::NewUser;

    fn db_with_user() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&NewUser {
            id: "alice",
            username: "alice",
            email: "alice@example.com",
            password_hash: "hash",
            first_name: None,
            last_name: None,
        })
        .unwrap();
        db
    }

    fn playlist<'a>(id: &'a str, provider: &'a str) -> NewPlaylist<'a> {
        NewPlaylist {
            id,
            owner_id: "alice",
            url: "https://open.spotify.com/playlist/abc",
            provider,
            title: None,
            description: None,
            embed_code: "<iframe></iframe>",
        }
    }

    #[test]
    fn provider_filter_matches() {
        let db = db_with_user();
        db.insert_playlist(&playlist("p1", "spotify")).unwrap();
        db.insert_playlist(&playlist("p2", "youtube")).unwrap();

        assert_eq!(db.list_playlists_by_provider("spotify").unwrap().len(), 1);
        assert_eq!(db.list_playlists_by_provider("applemusic").unwrap().len(), 0);
    }

    #[test]
    fn unknown_provider_string_is_rejected() {
        let db = db_with_user();
        assert!(matches!(
            db.insert_playlist(&playlist("p1", "soundcloud")),
            Err(DbError::Conflict)
        ));
    }

    #[test]
    fn update_only_touches_given_fields() {
        let db = db_with_user();
        db.insert_playlist(&NewPlaylist {
            title: Some("mix"),
            ..playlist("p1", "spotify")
        })
        .unwrap();

        db.update_playlist("p1", None, Some("late night")).unwrap();

        let row = db.get_playlist("p1").unwrap().unwrap();
        assert_eq!(row.title.as_deref(), Some("mix"));
        assert_eq!(row.description.as_deref(), Some("late night"));
        assert_eq!(row.owner_username, "alice");
    }
}
