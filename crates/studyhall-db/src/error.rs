use rusqlite::ErrorCode;
use rusqlite::ffi;
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLite error that is not a uniqueness violation.
    #[error("Database error: {0}")]
    Sqlite(rusqlite::Error),

    /// UNIQUE or PRIMARY KEY constraint violated. Carries the constraint text
    /// reported by SQLite, e.g. `classes.join_code`.
    #[error("Constraint violated: {0}")]
    Conflict(String),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    #[error("DB lock poisoned")]
    LockPoisoned,
}

impl DbError {
    /// Busy/locked errors are worth one retry; everything else is final.
    pub fn is_transient(&self) -> bool {
        match self {
            DbError::Sqlite(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }

    /// True if this is a uniqueness conflict on the given constraint columns.
    pub fn is_conflict_on(&self, columns: &str) -> bool {
        matches!(self, DbError::Conflict(c) if c.contains(columns))
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::QueryReturnedNoRows => DbError::NotFound,
            rusqlite::Error::SqliteFailure(ref err, ref msg)
                if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                    || err.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                let constraint = msg
                    .as_deref()
                    .and_then(|m| m.strip_prefix("UNIQUE constraint failed: "))
                    .unwrap_or("unknown")
                    .to_string();
                DbError::Conflict(constraint)
            }
            other => DbError::Sqlite(other),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DbError>;
