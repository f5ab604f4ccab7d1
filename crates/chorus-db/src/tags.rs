use rusqlite::OptionalExtension;

use crate::models::TagRow;
use crate::{Database, DbError, Result};

impl Database {
    pub fn insert_tag(&self, id: &str, name: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("INSERT INTO tags (id, name) VALUES (?1, ?2)", [id, name])?;
            Ok(())
        })
    }

    pub fn get_tag(&self, id: &str) -> Result<Option<TagRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row("SELECT id, name FROM tags WHERE id = ?1", [id], |row| {
                    Ok(TagRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                })
                .optional()?;
            Ok(row)
        })
    }

    pub fn list_tags(&self) -> Result<Vec<TagRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM tags ORDER BY name")?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(TagRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn delete_tag(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM tags WHERE id = ?1", [id])?;
            if affected == 0 {
                return Err(DbError::NotFound);
            }
            Ok(())
        })
    }
}
