use rusqlite::OptionalExtension;

use crate::models::NotificationRow;
use crate::{Database, DbError, Result};

pub struct NewNotification<'a> {
    pub id: &'a str,
    pub kind: &'a str,
    pub recipient_id: &'a str,
    pub trigger_user_id: &'a str,
    pub post_id: Option<&'a str>,
    pub comment_id: Option<&'a str>,
}

impl Database {
    /// Pure insert; no dedup, no batching.
    pub fn insert_notification(&self, n: &NewNotification) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notifications (id, kind, recipient_id, trigger_user_id, post_id, comment_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    n.id,
                    n.kind,
                    n.recipient_id,
                    n.trigger_user_id,
                    n.post_id,
                    n.comment_id
                ],
            )?;
            Ok(())
        })
    }

    /// Recipient's notifications, newest first, joined with the triggering
    /// user's username.
    pub fn list_notifications_for_user(&self, user_id: &str) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT n.id, n.kind, n.recipient_id, n.trigger_user_id, u.username,
                        n.post_id, n.comment_id, n.read, n.created_at
                 FROM notifications n
                 JOIN users u ON u.id = n.trigger_user_id
                 WHERE n.recipient_id = ?1
                 ORDER BY n.created_at DESC, n.id",
            )?;

            let rows = stmt
                .query_map([user_id], notification_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn get_notification(&self, id: &str) -> Result<Option<NotificationRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT n.id, n.kind, n.recipient_id, n.trigger_user_id, u.username,
                            n.post_id, n.comment_id, n.read, n.created_at
                     FROM notifications n
                     JOIN users u ON u.id = n.trigger_user_id
                     WHERE n.id = ?1",
                    [id],
                    notification_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn mark_notification_read(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let affected =
                conn.execute("UPDATE notifications SET read = 1 WHERE id = ?1", [id])?;
            if affected == 0 {
                return Err(DbError::NotFound);
            }
            Ok(())
        })
    }

    /// Flips only currently-unread rows; returns how many were touched.
    pub fn mark_all_notifications_read(&self, user_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "UPDATE notifications SET read = 1 WHERE recipient_id = ?1 AND read = 0",
                [user_id],
            )?;
            Ok(affected)
        })
    }

    pub fn delete_notification(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM notifications WHERE id = ?1", [id])?;
            if affected == 0 {
                return Err(DbError::NotFound);
            }
            Ok(())
        })
    }
}

fn notification_from_row(
    row: &rusqlite::Row,
) -> std::result::Result<NotificationRow, rusqlite::Error> {
    Ok(NotificationRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        recipient_id: row.get(2)?,
        trigger_user_id: row.get(3)?,
        trigger_username: row.get(4)?,
        post_id: row.get(5)?,
        comment_id: row.get(6)?,
        read: row.get(7)?,
        created_at: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::NewUser;

    fn db_with_users(usernames: &[&str]) -> Database {
        let db = Database::open_in_memory().unwrap();
        for name in usernames {
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
        db
    }

    fn notify(db: &Database, id: &str, kind: &str, recipient: &str, trigger: &str) {
        db.insert_notification(&NewNotification {
            id,
            kind,
            recipient_id: recipient,
            trigger_user_id: trigger,
            post_id: None,
            comment_id: None,
        })
        .unwrap();
    }

    #[test]
    fn list_is_scoped_to_recipient() {
        let db = db_with_users(&["alice", "bob"]);
        notify(&db, "n1", "LIKE", "alice", "bob");
        notify(&db, "n2", "COMMENT", "bob", "alice");

        let rows = db.list_notifications_for_user("alice").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, "LIKE");
        assert_eq!(rows[0].trigger_username, "bob");
    }

    #[test]
    fn mark_all_touches_only_unread() {
        let db = db_with_users(&["alice", "bob"]);
        notify(&db, "n1", "LIKE", "alice", "bob");
        notify(&db, "n2", "VOTE", "alice", "bob");
        db.mark_notification_read("n1").unwrap();

        assert_eq!(db.mark_all_notifications_read("alice").unwrap(), 1);
        assert_eq!(db.mark_all_notifications_read("alice").unwrap(), 0);

        let rows = db.list_notifications_for_user("alice").unwrap();
        assert!(rows.iter().all(|n| n.read));
    }

    #[test]
    fn delete_removes_the_row() {
        let db = db_with_users(&["alice", "bob"]);
        notify(&db, "n1", "LIKE", "alice", "bob");

        db.delete_notification("n1").unwrap();
        assert!(db.list_notifications_for_user("alice").unwrap().is_empty());
        assert!(matches!(
            db.delete_notification("n1"),
            Err(DbError::NotFound)
        ));
    }

    #[test]
    fn bad_kind_is_rejected_by_schema() {
        let db = db_with_users(&["alice", "bob"]);
        let result = db.insert_notification(&NewNotification {
            id: "n1",
            kind: "POKE",
            recipient_id: "alice",
            trigger_user_id: "bob",
            post_id: None,
            comment_id: None,
        });
        assert!(matches!(result, Err(DbError::Conflict)));
    }
}
