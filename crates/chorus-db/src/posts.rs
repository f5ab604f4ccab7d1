use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::models::{PostRow, PostTagRow, RankedPostRow};
use crate::{Database, DbError, Result};

const POST_SELECT: &str = "SELECT p.id, p.author_id, u.username, p.content, p.published, p.created_at
     FROM posts p
     JOIN users u ON u.id = p.author_id";

impl Database {
    /// Insert a post and connect its tags in one transaction. Tags are
    /// matched by name and created on first use.
    pub fn create_post(
        &self,
        id: &str,
        author_id: &str,
        content: &str,
        published: bool,
        tags: &[String],
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction().map_err(DbError::from)?;

            tx.execute(
                "INSERT INTO posts (id, author_id, content, published) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, author_id, content, published],
            )?;

            for name in tags {
                let tag_id: Option<String> = tx
                    .query_row("SELECT id FROM tags WHERE name = ?1", [name.as_str()], |row| {
                        row.get(0)
                    })
                    .optional()?;

                let tag_id = match tag_id {
                    Some(existing) => existing,
                    None => {
                        let new_id = Uuid::new_v4().to_string();
                        tx.execute(
                            "INSERT INTO tags (id, name) VALUES (?1, ?2)",
                            [new_id.as_str(), name.as_str()],
                        )?;
                        new_id
                    }
                };

                tx.execute(
                    "INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?1, ?2)",
                    [id, tag_id.as_str()],
                )?;
            }

            tx.commit().map_err(DbError::from)?;
            Ok(())
        })
    }

    pub fn list_posts(&self) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            query_posts(conn, &format!("{POST_SELECT} ORDER BY p.created_at DESC, p.id"), [])
        })
    }

    pub fn get_post(&self, id: &str) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(&format!("{POST_SELECT} WHERE p.id = ?1"), [id], post_from_row)
                .optional()?;
            Ok(row)
        })
    }

    pub fn list_posts_by_author(&self, author_id: &str) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            query_posts(
                conn,
                &format!("{POST_SELECT} WHERE p.author_id = ?1 ORDER BY p.created_at DESC, p.id"),
                [author_id],
            )
        })
    }

    pub fn update_post(
        &self,
        id: &str,
        content: Option<&str>,
        published: Option<bool>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "UPDATE posts SET
                     content = COALESCE(?2, content),
                     published = COALESCE(?3, published)
                 WHERE id = ?1",
                rusqlite::params![id, content, published],
            )?;
            if affected == 0 {
                return Err(DbError::NotFound);
            }
            Ok(())
        })
    }

    /// Comments, likes, tag links, and notifications referencing the post
    /// all go with it via ON DELETE CASCADE.
    pub fn delete_post(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
            if affected == 0 {
                return Err(DbError::NotFound);
            }
            Ok(())
        })
    }

    /// Batch-fetch tag names for a set of post IDs.
    pub fn get_tags_for_posts(&self, post_ids: &[String]) -> Result<Vec<PostTagRow>> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=post_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT pt.post_id, t.name
                 FROM post_tags pt
                 JOIN tags t ON t.id = pt.tag_id
                 WHERE pt.post_id IN ({})
                 ORDER BY t.name",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = post_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), |row| {
                    Ok(PostTagRow {
                        post_id: row.get(0)?,
                        tag_name: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Case-insensitive substring search over post content. The term is
    /// matched literally; LIKE wildcards in it are escaped.
    pub fn search_posts(&self, term: &str) -> Result<Vec<PostRow>> {
        let pattern = format!("%{}%", crate::escape_like(term));
        self.with_conn(|conn| {
            query_posts(
                conn,
                &format!(
                    "{POST_SELECT} WHERE p.content LIKE ?1 ESCAPE '\\'
                     ORDER BY p.created_at DESC, p.id"
                ),
                [pattern.as_str()],
            )
        })
    }

    /// The caller's own posts plus their friends' posts, newest first.
    pub fn feed_posts(&self, user_id: &str) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            query_posts(
                conn,
                &format!(
                    "{POST_SELECT}
                     WHERE p.author_id = ?1
                        OR p.author_id IN (
                            SELECT CASE WHEN f.user_lo = ?1 THEN f.user_hi ELSE f.user_lo END
                            FROM friendships f
                            WHERE f.user_lo = ?1 OR f.user_hi = ?1
                        )
                     ORDER BY p.created_at DESC, p.id"
                ),
                [user_id],
            )
        })
    }

    /// Most-liked posts, for topping up a feed.
    pub fn trending_posts(&self, limit: u32) -> Result<Vec<RankedPostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.author_id, u.username, p.content, p.published, p.created_at,
                        COUNT(l.id) AS like_count
                 FROM posts p
                 JOIN users u ON u.id = p.author_id
                 LEFT JOIN likes l ON l.post_id = p.id
                 GROUP BY p.id
                 ORDER BY like_count DESC, p.created_at DESC
                 LIMIT ?1",
            )?;

            let rows = stmt
                .query_map([limit], |row| {
                    Ok(RankedPostRow {
                        post: post_from_row(row)?,
                        like_count: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_posts<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<PostRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, post_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn post_from_row(row: &rusqlite::Row) -> std::result::Result<PostRow, rusqlite::Error> {
    Ok(PostRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        author_username: row.get(2)?,
        content: row.get(3)?,
        published: row.get(4)?,
        created_at: row.get(5)?,
    })
}
