use thiserror::Error;

/// Storage-layer error. Uniqueness and foreign-key constraints are the
/// enforcement point for every at-most-one invariant, so a constraint
/// violation surfaces as a typed `Conflict` rather than a raw SQLite error.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("conflicts with an existing record")]
    Conflict,

    #[error("record not found")]
    NotFound,

    #[error("database lock poisoned")]
    Poisoned,

    #[error(transparent)]
    Sqlite(rusqlite::Error),
}

impl From<rusqlite::Error> for DbError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(f, _)
                if f.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                DbError::Conflict
            }
            _ => DbError::Sqlite(e),
        }
    }
}
