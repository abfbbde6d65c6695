use tracing::info;

use studyhall_db::{Database, files, sharing};
use studyhall_types::models::{FileId, FolderFilter, UserFile, UserId};

use crate::authz;
use crate::{CoreError, Result, atomically, validate_name};

/// Longest accepted file name, in characters.
const MAX_FILE_NAME_LEN: usize = 255;

/// Record metadata for a file whose bytes were stored elsewhere.
pub fn register_file(db: &Database, owner_id: UserId, name: &str, size: i64) -> Result<UserFile> {
    let name = validate_name("File name", name, MAX_FILE_NAME_LEN)?;
    if size < 0 {
        return Err(CoreError::InvalidInput("file size must not be negative".into()));
    }
    let file = db.with_conn(|conn| files::insert(conn, owner_id, &name, size))?;
    info!(file_id = file.id, owner_id, "File registered");
    Ok(file)
}

pub fn list_files(db: &Database, owner_id: UserId, filter: FolderFilter) -> Result<Vec<UserFile>> {
    db.with_conn(|conn| Ok(files::list_for_user(conn, owner_id, filter)?))
}

/// Shares of the file are removed first, then the file itself. Group links
/// go with the file row.
pub fn delete_file(db: &Database, owner_id: UserId, file_id: FileId) -> Result<()> {
    atomically(db, |conn| {
        authz::require_file_owner(conn, owner_id, file_id)?;

        let shares = sharing::delete_for_file(conn, file_id)?;
        files::delete(conn, file_id)?;

        info!(file_id, shares, "File deleted");
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sharing as share_ops;
    use crate::testutil::{self, OWNER, STUDENT};

    #[test]
    fn delete_file_removes_its_shares() {
        let db = testutil::seeded();
        let file = testutil::file(&db, OWNER, "slides.pdf");
        let share = share_ops::share_file(&db, OWNER, STUDENT, file.id, "Slides", None).unwrap();

        delete_file(&db, OWNER, file.id).unwrap();

        assert!(share_ops::list_received(&db, STUDENT).unwrap().is_empty());
        assert!(matches!(
            share_ops::mark_share_read(&db, share.id, STUDENT),
            Err(CoreError::NotFound(_))
        ));
    }

    #[test]
    fn only_owner_deletes_file() {
        let db = testutil::seeded();
        let file = testutil::file(&db, OWNER, "slides.pdf");

        assert!(matches!(
            delete_file(&db, STUDENT, file.id),
            Err(CoreError::Forbidden)
        ));
        assert_eq!(list_files(&db, OWNER, FolderFilter::All).unwrap().len(), 1);
    }

    #[test]
    fn negative_size_is_rejected() {
        let db = testutil::seeded();
        assert!(matches!(
            register_file(&db, OWNER, "x", -1),
            Err(CoreError::InvalidInput(_))
        ));
    }
}
