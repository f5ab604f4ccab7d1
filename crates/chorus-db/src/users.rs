use rusqlite::{Connection, OptionalExtension};

use crate::models::UserRow;
use crate::{Database, DbError, Result};

const USER_COLUMNS: &str =
    "id, username, email, password, first_name, last_name, bio, location, avatar_url, created_at";

pub struct NewUser<'a> {
    pub id: &'a str,
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
}

/// Profile fields for an update; `None` leaves the stored value untouched.
#[derive(Default)]
pub struct ProfileUpdate<'a> {
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub location: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
    pub password_hash: Option<&'a str>,
}

impl Database {
    pub fn create_user(&self, user: &NewUser) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password, first_name, last_name)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    user.id,
                    user.username,
                    user.email,
                    user.password_hash,
                    user.first_name,
                    user.last_name
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_user(conn, "username = ?1", username)
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", id))
    }

    pub fn update_user(&self, id: &str, update: &ProfileUpdate) -> Result<()> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "UPDATE users SET
                     first_name = COALESCE(?2, first_name),
                     last_name  = COALESCE(?3, last_name),
                     bio        = COALESCE(?4, bio),
                     location   = COALESCE(?5, location),
                     avatar_url = COALESCE(?6, avatar_url),
                     password   = COALESCE(?7, password)
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    update.first_name,
                    update.last_name,
                    update.bio,
                    update.location,
                    update.avatar_url,
                    update.password_hash
                ],
            )?;
            if affected == 0 {
                return Err(DbError::NotFound);
            }
            Ok(())
        })
    }

    /// Owned content goes with the account via ON DELETE CASCADE.
    pub fn delete_user(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            if affected == 0 {
                return Err(DbError::NotFound);
            }
            Ok(())
        })
    }

    /// Case-insensitive substring search over username and name fields.
    /// The term is matched literally; LIKE wildcards in it are escaped.
    pub fn search_users(&self, term: &str) -> Result<Vec<UserRow>> {
        let pattern = format!("%{}%", crate::escape_like(term));
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users
                 WHERE username LIKE ?1 ESCAPE '\\'
                    OR first_name LIKE ?1 ESCAPE '\\'
                    OR last_name LIKE ?1 ESCAPE '\\'
                 ORDER BY username"
            ))?;

            let rows = stmt
                .query_map([pattern.as_str()], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_user(conn: &Connection, predicate: &str, param: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE {predicate}"))?;

    let row = stmt.query_row([param], user_from_row).optional()?;

    Ok(row)
}

fn user_from_row(row: &rusqlite::Row) -> std::result::Result<UserRow, rusqlite::Error> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        first_name: row.get(4)?,
        last_name: row.get(5)?,
        bio: row.get(6)?,
        location: row.get(7)?,
        avatar_url: row.get(8)?,
        created_at: row.get(9)?,
    })
}
