use rusqlite::OptionalExtension;

use crate::models::LikeRow;
use crate::{Database, DbError, Result};

impl Database {
    /// At most one like per (post, user); the UNIQUE constraint turns a
    /// duplicate into `Conflict` with no check-then-write window.
    pub fn insert_like(&self, id: &str, post_id: &str, user_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO likes (id, post_id, user_id) VALUES (?1, ?2, ?3)",
                [id, post_id, user_id],
            )?;
            Ok(())
        })
    }

    pub fn get_like(&self, id: &str) -> Result<Option<LikeRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, post_id, user_id, created_at FROM likes WHERE id = ?1",
                    [id],
                    like_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn list_likes_for_post(&self, post_id: &str) -> Result<Vec<LikeRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, post_id, user_id, created_at FROM likes
                 WHERE post_id = ?1 ORDER BY created_at, id",
            )?;

            let rows = stmt
                .query_map([post_id], like_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Remove the caller's like on a post.
    pub fn delete_like(&self, post_id: &str, user_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "DELETE FROM likes WHERE post_id = ?1 AND user_id = ?2",
                [post_id, user_id],
            )?;
            if affected == 0 {
                return Err(DbError::NotFound);
            }
            Ok(())
        })
    }
}

fn like_from_row(row: &rusqlite::Row) -> std::result::Result<LikeRow, rusqlite::Error> {
    Ok(LikeRow {
        id: row.get(0)?,
        post_id: row.get(1)?,
        user_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}
