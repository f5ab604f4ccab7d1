//! Friendship graph and friend-request workflow.
//!
//! A friendship is an undirected edge. The pair is stored canonically
//! ordered (`user_lo < user_hi`), so the table's UNIQUE constraint enforces
//! symmetric uniqueness and membership checks need only one lookup. A
//! partial unique index on `friend_requests` keeps concurrent duplicate
//! requests out without a check-then-write window.

use rusqlite::OptionalExtension;

use crate::models::{FriendRequestRow, FriendRow};
use crate::{Database, DbError, Result};

/// Order an unordered user pair for canonical storage.
pub fn canonical_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b { (a, b) } else { (b, a) }
}

impl Database {
    /// Create a PENDING request and its FRIEND_REQUEST notification in one
    /// transaction. Fails with `Conflict` if the two users are already
    /// friends or a pending request exists in either direction.
    pub fn send_friend_request(
        &self,
        request_id: &str,
        sender_id: &str,
        recipient_id: &str,
        notification_id: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction().map_err(DbError::from)?;

            let (lo, hi) = canonical_pair(sender_id, recipient_id);
            let already_friends: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM friendships WHERE user_lo = ?1 AND user_hi = ?2)",
                [lo, hi],
                |row| row.get(0),
            )?;
            if already_friends {
                return Err(DbError::Conflict);
            }

            // The pending-pair unique index rejects a duplicate request in
            // either direction.
            tx.execute(
                "INSERT INTO friend_requests (id, sender_id, recipient_id, status)
                 VALUES (?1, ?2, ?3, 'PENDING')",
                [request_id, sender_id, recipient_id],
            )?;

            tx.execute(
                "INSERT INTO notifications (id, kind, recipient_id, trigger_user_id)
                 VALUES (?1, 'FRIEND_REQUEST', ?2, ?3)",
                [notification_id, recipient_id, sender_id],
            )?;

            tx.commit().map_err(DbError::from)?;
            Ok(())
        })
    }

    pub fn get_friend_request(&self, id: &str) -> Result<Option<FriendRequestRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT r.id, r.sender_id, u.username, r.recipient_id, r.status, r.created_at
                     FROM friend_requests r
                     JOIN users u ON u.id = r.sender_id
                     WHERE r.id = ?1",
                    [id],
                    request_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Pending requests addressed to `user_id`, newest first.
    pub fn list_incoming_requests(&self, user_id: &str) -> Result<Vec<FriendRequestRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT r.id, r.sender_id, u.username, r.recipient_id, r.status, r.created_at
                 FROM friend_requests r
                 JOIN users u ON u.id = r.sender_id
                 WHERE r.recipient_id = ?1 AND r.status = 'PENDING'
                 ORDER BY r.created_at DESC",
            )?;

            let rows = stmt
                .query_map([user_id], request_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Transition PENDING -> ACCEPTED and materialize the friendship edge.
    /// Both writes happen in one transaction; they are never observable
    /// independently. ACCEPTED is terminal and the request row is kept.
    pub fn accept_friend_request(&self, request_id: &str, friendship_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction().map_err(DbError::from)?;

            let updated = tx.execute(
                "UPDATE friend_requests SET status = 'ACCEPTED'
                 WHERE id = ?1 AND status = 'PENDING'",
                [request_id],
            )?;
            if updated == 0 {
                return Err(DbError::NotFound);
            }

            let (sender_id, recipient_id): (String, String) = tx.query_row(
                "SELECT sender_id, recipient_id FROM friend_requests WHERE id = ?1",
                [request_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let (lo, hi) = canonical_pair(&sender_id, &recipient_id);
            tx.execute(
                "INSERT INTO friendships (id, user_lo, user_hi) VALUES (?1, ?2, ?3)",
                [friendship_id, lo, hi],
            )?;

            tx.commit().map_err(DbError::from)?;
            Ok(())
        })
    }

    /// A declined request is deleted outright; no DECLINED state is kept.
    pub fn decline_friend_request(&self, request_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "DELETE FROM friend_requests WHERE id = ?1 AND status = 'PENDING'",
                [request_id],
            )?;
            if affected == 0 {
                return Err(DbError::NotFound);
            }
            Ok(())
        })
    }

    /// Everyone connected to `user_id`, resolving the other side of each
    /// canonical pair.
    pub fn list_friends(&self, user_id: &str) -> Result<Vec<FriendRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.username, u.avatar_url, f.created_at
                 FROM friendships f
                 JOIN users u
                   ON u.id = CASE WHEN f.user_lo = ?1 THEN f.user_hi ELSE f.user_lo END
                 WHERE f.user_lo = ?1 OR f.user_hi = ?1
                 ORDER BY u.username",
            )?;

            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(FriendRow {
                        user_id: row.get(0)?,
                        username: row.get(1)?,
                        avatar_url: row.get(2)?,
                        friends_since: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Order-independent membership test.
    pub fn are_friends(&self, a: &str, b: &str) -> Result<bool> {
        let (lo, hi) = canonical_pair(a, b);
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM friendships WHERE user_lo = ?1 AND user_hi = ?2)",
                [lo, hi],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    pub fn remove_friend(&self, a: &str, b: &str) -> Result<()> {
        let (lo, hi) = canonical_pair(a, b);
        self.with_conn(|conn| {
            let affected = conn.execute(
                "DELETE FROM friendships WHERE user_lo = ?1 AND user_hi = ?2",
                [lo, hi],
            )?;
            if affected == 0 {
                return Err(DbError::NotFound);
            }
            Ok(())
        })
    }
}

fn request_from_row(row: &rusqlite::Row) -> std::result::Result<FriendRequestRow, rusqlite::Error> {
    Ok(FriendRequestRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        sender_username: row.get(2)?,
        recipient_id: row.get(3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
    })
}
