use rusqlite::OptionalExtension;

use crate::models::CommentRow;
use crate::{Database, DbError, Result};

const COMMENT_SELECT: &str =
    "SELECT c.id, c.post_id, c.author_id, u.username, c.body, c.created_at
     FROM comments c
     JOIN users u ON u.id = c.author_id";

impl Database {
    pub fn insert_comment(
        &self,
        id: &str,
        post_id: &str,
        author_id: &str,
        body: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (id, post_id, author_id, body) VALUES (?1, ?2, ?3, ?4)",
                [id, post_id, author_id, body],
            )?;
            Ok(())
        })
    }

    pub fn get_comment(&self, id: &str) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("{COMMENT_SELECT} WHERE c.id = ?1"),
                    [id],
                    comment_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn list_comments_for_post(&self, post_id: &str) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{COMMENT_SELECT} WHERE c.post_id = ?1 ORDER BY c.created_at, c.id"
            ))?;

            let rows = stmt
                .query_map([post_id], comment_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn delete_comment(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM comments WHERE id = ?1", [id])?;
            if affected == 0 {
                return Err(DbError::NotFound);
            }
            Ok(())
        })
    }
}

fn comment_from_row(row: &rusqlite::Row) -> std::result::Result<CommentRow, rusqlite::Error> {
    Ok(CommentRow {
        id: row.get(0)?,
        post_id: row.get(1)?,
        author_id: row.get(2)?,
        author_username: row.get(3)?,
        body: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::NewUser;

    fn db_with_post() -> Database {
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
        db.create_post("p1", "alice", "a post", true, &[]).unwrap();
        db
    }

    #[test]
    fn comments_list_in_creation_order() {
        let db = db_with_post();
        db.insert_comment("c1", "p1", "alice", "first").unwrap();
        db.insert_comment("c2", "p1", "alice", "second").unwrap();

        let rows = db.list_comments_for_post("p1").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].body, "first");
        assert_eq!(rows[1].author_username, "alice");
    }

    #[test]
    fn comment_on_missing_post_is_a_conflict() {
        let db = db_with_post();
        // Foreign key violation surfaces as a constraint conflict.
        assert!(matches!(
            db.insert_comment("c1", "nope", "alice", "text"),
            Err(DbError::Conflict)
        ));
    }

    #[test]
    fn deleting_post_cascades_to_comments() {
        let db = db_with_post();
        db.insert_comment("c1", "p1", "alice", "first").unwrap();
        db.delete_post("p1").unwrap();

        assert!(db.get_comment("c1").unwrap().is_none());
    }
}
