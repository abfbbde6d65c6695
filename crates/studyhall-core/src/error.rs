use studyhall_db::DbError;
use thiserror::Error;

/// Domain errors. Every variant renders as a short message that is safe to
/// show to the user; `Store` details are only ever logged.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Not authenticated")]
    Unauthorized,

    #[error("You do not have permission to do that")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0} already exists")]
    Conflict(&'static str),

    #[error("Already a member of this class")]
    AlreadyMember,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("This class is not accepting new members")]
    JoinDisabled,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Store error: {0}")]
    Store(DbError),
}

impl CoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::Store(e) if e.is_transient())
    }
}

impl From<DbError> for CoreError {
    fn from(e: DbError) -> Self {
        match e {
            // Conflicts the caller did not anticipate still must not leak SQL.
            DbError::Conflict(_) => CoreError::Conflict("Record"),
            other => CoreError::Store(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
