use tracing::{debug, info};

use studyhall_db::{Database, sharing, users};
use studyhall_types::models::{FileId, SharedFile, UserId};

use crate::authz;
use crate::{CoreError, Result, validate_name};

const MAX_DESCRIPTION_LEN: usize = 1000;

/// Share one of the sender's files with another user.
pub fn share_file(
    db: &Database,
    sender_id: UserId,
    recipient_id: UserId,
    file_id: FileId,
    display_name: &str,
    description: Option<&str>,
) -> Result<SharedFile> {
    let name = validate_name("Shared file name", display_name, 255)?;
    let description = description.map(str::trim).filter(|d| !d.is_empty());
    if description.is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN) {
        return Err(CoreError::InvalidInput(format!(
            "description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }

    db.transaction(|conn| {
        authz::require_file_owner(conn, sender_id, file_id)?;
        if !users::exists(conn, recipient_id)? {
            return Err(CoreError::NotFound("Recipient"));
        }

        let share = sharing::insert(conn, sender_id, recipient_id, file_id, &name, description)?;
        info!(share_id = share.id, sender_id, recipient_id, file_id, "File shared");
        Ok(share)
    })
}

pub fn list_received(db: &Database, user_id: UserId) -> Result<Vec<SharedFile>> {
    db.with_conn(|conn| Ok(sharing::list_received(conn, user_id)?))
}

pub fn list_sent(db: &Database, user_id: UserId) -> Result<Vec<SharedFile>> {
    db.with_conn(|conn| Ok(sharing::list_sent(conn, user_id)?))
}

/// Only the recipient may mark a share read. The first call stamps
/// `read_at`; later calls leave it unchanged.
pub fn mark_share_read(db: &Database, share_id: i64, reader_id: UserId) -> Result<SharedFile> {
    db.transaction(|conn| {
        let share = sharing::get(conn, share_id)?.ok_or(CoreError::NotFound("Shared file"))?;
        if share.recipient_id != reader_id {
            return Err(CoreError::Forbidden);
        }
        if share.is_read {
            debug!(share_id, "Share already read");
            return Ok(share);
        }

        sharing::mark_read(conn, share_id)?;
        sharing::get(conn, share_id)?.ok_or(CoreError::NotFound("Shared file"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{self, OUTSIDER, OWNER, STUDENT};

    #[test]
    fn cannot_share_someone_elses_file() {
        let db = testutil::seeded();
        let file = testutil::file(&db, OWNER, "answers.pdf");

        assert!(matches!(
            share_file(&db, STUDENT, OUTSIDER, file.id, "Answers", None),
            Err(CoreError::Forbidden)
        ));
    }

    #[test]
    fn unknown_recipient_is_not_found() {
        let db = testutil::seeded();
        let file = testutil::file(&db, OWNER, "answers.pdf");

        assert!(matches!(
            share_file(&db, OWNER, 404, file.id, "Answers", None),
            Err(CoreError::NotFound(_))
        ));
    }

    #[test]
    fn blank_description_is_stored_as_none() {
        let db = testutil::seeded();
        let file = testutil::file(&db, OWNER, "a.pdf");
        let share = share_file(&db, OWNER, STUDENT, file.id, "A", Some("   ")).unwrap();
        assert_eq!(share.description, None);

        let share = share_file(&db, OWNER, STUDENT, file.id, "A", Some("week 1")).unwrap();
        assert_eq!(share.description.as_deref(), Some("week 1"));
        assert_eq!(list_sent(&db, OWNER).unwrap().len(), 2);
    }

    #[test]
    fn mark_read_is_once_and_recipient_only() {
        let db = testutil::seeded();
        let file = testutil::file(&db, OWNER, "a.pdf");
        let share = share_file(&db, OWNER, STUDENT, file.id, "A", None).unwrap();
        assert!(!share.is_read);

        assert!(matches!(
            mark_share_read(&db, share.id, OWNER),
            Err(CoreError::Forbidden)
        ));

        let first = mark_share_read(&db, share.id, STUDENT).unwrap();
        assert!(first.is_read);
        let read_at = first.read_at.expect("read_at set");

        let second = mark_share_read(&db, share.id, STUDENT).unwrap();
        assert_eq!(second.read_at, Some(read_at));
    }
}
