use rusqlite::OptionalExtension;

use crate::models::VoteRow;
use crate::{Database, DbError, Result};

impl Database {
    /// At most one vote per (comment, user), enforced by the UNIQUE
    /// constraint rather than an existence check before insert.
    pub fn insert_vote(
        &self,
        id: &str,
        comment_id: &str,
        user_id: &str,
        kind: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO votes (id, comment_id, user_id, kind) VALUES (?1, ?2, ?3, ?4)",
                [id, comment_id, user_id, kind],
            )?;
            Ok(())
        })
    }

    pub fn get_vote(&self, id: &str) -> Result<Option<VoteRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, comment_id, user_id, kind, created_at FROM votes WHERE id = ?1",
                    [id],
                    vote_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn list_votes_for_comment(&self, comment_id: &str) -> Result<Vec<VoteRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, comment_id, user_id, kind, created_at FROM votes
                 WHERE comment_id = ?1 ORDER BY created_at, id",
            )?;

            let rows = stmt
                .query_map([comment_id], vote_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn delete_vote(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM votes WHERE id = ?1", [id])?;
            if affected == 0 {
                return Err(DbError::NotFound);
            }
            Ok(())
        })
    }
}

fn vote_from_row(row: &rusqlite::Row) -> std::result::Result<VoteRow, rusqlite::Error> {
    Ok(VoteRow {
        id: row.get(0)?,
        comment_id: row.get(1)?,
        user_id: row.get(2)?,
        kind: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::NewUser;

    fn db_with_comment() -> Database {
        let db = Database::open_in_memory().unwrap();
        for name in ["alice", "bob"] {
            let email = format!("{name}@example.com");
            db.create_user(&NewUser {
                id: name,
                username: name,
                email: &email,
                password_hash: "hash",
                first_name: None,
                last_name: None,
            })
            .unwrap();
        }
        db.create_post("p1", "alice", "a post", true, &[]).unwrap();
        db.insert_comment("c1", "p1", "alice", "a comment").unwrap();
        db
    }

    #[test]
    fn second_vote_by_same_user_conflicts() {
        let db = db_with_comment();
        db.insert_vote("v1", "c1", "bob", "UP").unwrap();

        // Same user, same comment: conflict regardless of direction.
        assert!(matches!(
            db.insert_vote("v2", "c1", "bob", "DOWN"),
            Err(DbError::Conflict)
        ));
        // Another user can still vote.
        db.insert_vote("v3", "c1", "alice", "DOWN").unwrap();
        assert_eq!(db.list_votes_for_comment("c1").unwrap().len(), 2);
    }

    #[test]
    fn vote_kind_is_constrained() {
        let db = db_with_comment();
        assert!(matches!(
            db.insert_vote("v1", "c1", "bob", "SIDEWAYS"),
            Err(DbError::Conflict)
        ));
    }

    #[test]
    fn delete_then_revote() {
        let db = db_with_comment();
        db.insert_vote("v1", "c1", "bob", "UP").unwrap();
        db.delete_vote("v1").unwrap();
        assert!(matches!(db.delete_vote("v1"), Err(DbError::NotFound)));
        db.insert_vote("v2", "c1", "bob", "DOWN").unwrap();
    }
}
