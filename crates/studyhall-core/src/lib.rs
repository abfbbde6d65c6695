//! # studyhall-core
//!
//! Domain operations over the store: class membership and ownership, file
//! groups and folders, file sharing, and messaging. Every mutating operation
//! checks its authorization predicate (see [`authz`]) before touching state and
//! runs its writes inside one transaction, so a failure never leaves a partial
//! effect behind.

pub mod authz;
pub mod codes;
pub mod files;
pub mod folders;
pub mod grouping;
pub mod membership;
pub mod messaging;
pub mod sharing;

mod error;

#[cfg(test)]
mod testutil;

pub use error::{CoreError, Result};

use rusqlite::Connection;
use studyhall_db::Database;
use tracing::warn;

/// Longest accepted class, folder and group name, in characters.
pub const MAX_NAME_LEN: usize = 100;

/// Longest accepted message or chat body, in characters.
pub const MAX_CONTENT_LEN: usize = 4000;

/// Run a multi-step write as one transaction, retrying exactly once when the
/// store reports a transient (busy/locked) failure.
pub(crate) fn atomically<T, F>(db: &Database, mut f: F) -> Result<T>
where
    F: FnMut(&Connection) -> Result<T>,
{
    match db.transaction(&mut f) {
        Err(e) if e.is_transient() => {
            warn!("Transient store error, retrying once: {}", e);
            db.transaction(&mut f)
        }
        other => other,
    }
}

/// Trim and bound a user-supplied name.
pub(crate) fn validate_name(what: &str, raw: &str, max: usize) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(CoreError::InvalidInput(format!("{what} must not be empty")));
    }
    if name.chars().count() > max {
        return Err(CoreError::InvalidInput(format!(
            "{what} must be at most {max} characters"
        )));
    }
    Ok(name.to_string())
}

pub(crate) fn validate_content(raw: &str) -> Result<&str> {
    if raw.trim().is_empty() {
        return Err(CoreError::InvalidInput("message must not be empty".into()));
    }
    if raw.chars().count() > MAX_CONTENT_LEN {
        return Err(CoreError::InvalidInput(format!(
            "message must be at most {MAX_CONTENT_LEN} characters"
        )));
    }
    Ok(raw)
}
