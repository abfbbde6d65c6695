//! File groups: named, possibly overlapping sets of a user's files. Deleting
//! a group or changing its members never touches the files themselves.

use rusqlite::Connection;
use tracing::info;

use studyhall_db::{Database, groups};
use studyhall_types::models::{FileGroups, FileId, UserId};

use crate::authz;
use crate::{CoreError, MAX_NAME_LEN, Result, validate_name};

const GROUP_NAME_CONSTRAINT: &str = "file_groups.user_id, file_groups.name";

pub fn list_groups(db: &Database, user_id: UserId) -> Result<FileGroups> {
    db.with_conn(|conn| Ok(groups::list(conn, user_id)?))
}

pub fn create_group(db: &Database, user_id: UserId, name: &str, file_ids: &[FileId]) -> Result<FileGroups> {
    let name = validate_name("Group name", name, MAX_NAME_LEN)?;
    db.transaction(|conn| {
        authz::require_files_owned(conn, user_id, file_ids)?;

        let group_id = match groups::insert(conn, user_id, &name) {
            Ok(id) => id,
            Err(e) if e.is_conflict_on(GROUP_NAME_CONSTRAINT) => {
                return Err(CoreError::Conflict("Group"));
            }
            Err(e) => return Err(e.into()),
        };
        groups::add_items(conn, group_id, file_ids)?;

        info!(user_id, group = %name, files = file_ids.len(), "Group created");
        Ok(groups::list(conn, user_id)?)
    })
}

/// Adding ids that are already present is a no-op.
pub fn add_to_group(db: &Database, user_id: UserId, name: &str, file_ids: &[FileId]) -> Result<FileGroups> {
    db.transaction(|conn| {
        let group_id = find_group(conn, user_id, name)?;
        authz::require_files_owned(conn, user_id, file_ids)?;

        groups::add_items(conn, group_id, file_ids)?;
        Ok(groups::list(conn, user_id)?)
    })
}

/// Removing ids that are not present is a no-op.
pub fn remove_from_group(
    db: &Database,
    user_id: UserId,
    name: &str,
    file_ids: &[FileId],
) -> Result<FileGroups> {
    db.transaction(|conn| {
        let group_id = find_group(conn, user_id, name)?;

        groups::remove_items(conn, group_id, file_ids)?;
        Ok(groups::list(conn, user_id)?)
    })
}

pub fn delete_group(db: &Database, user_id: UserId, name: &str) -> Result<()> {
    db.transaction(|conn| {
        let group_id = find_group(conn, user_id, name)?;
        groups::delete(conn, group_id)?;

        info!(user_id, group = %name.trim(), "Group deleted");
        Ok(())
    })
}

/// Names are stored trimmed, so lookups trim too.
fn find_group(conn: &Connection, user_id: UserId, name: &str) -> Result<i64> {
    groups::find(conn, user_id, name.trim())?.ok_or(CoreError::NotFound("Group"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files as file_ops;
    use crate::folders;
    use crate::testutil::{self, OWNER, STUDENT};
    use studyhall_types::models::FolderFilter;

    #[test]
    fn groups_may_overlap() {
        let db = testutil::seeded();
        let a = testutil::file(&db, OWNER, "a");
        let b = testutil::file(&db, OWNER, "b");

        create_group(&db, OWNER, "Exam", &[a.id, b.id]).unwrap();
        let groups = create_group(&db, OWNER, "Reading", &[a.id]).unwrap();

        assert_eq!(groups["Exam"], vec![a.id, b.id]);
        assert_eq!(groups["Reading"], vec![a.id]);
    }

    #[test]
    fn duplicate_group_name_is_conflict() {
        let db = testutil::seeded();
        create_group(&db, OWNER, "Exam", &[]).unwrap();
        assert!(matches!(
            create_group(&db, OWNER, "Exam", &[]),
            Err(CoreError::Conflict(_))
        ));
        // Other users have their own namespace.
        create_group(&db, STUDENT, "Exam", &[]).unwrap();
    }

    #[test]
    fn cannot_group_files_you_do_not_own() {
        let db = testutil::seeded();
        let theirs = testutil::file(&db, STUDENT, "theirs");

        assert!(matches!(
            create_group(&db, OWNER, "Mine", &[theirs.id]),
            Err(CoreError::Forbidden)
        ));
        // Nothing was created.
        assert!(list_groups(&db, OWNER).unwrap().is_empty());
    }

    #[test]
    fn membership_changes_are_idempotent() {
        let db = testutil::seeded();
        let a = testutil::file(&db, OWNER, "a");
        create_group(&db, OWNER, "G", &[a.id]).unwrap();

        let after_add = add_to_group(&db, OWNER, "G", &[a.id, a.id]).unwrap();
        assert_eq!(after_add["G"], vec![a.id]);

        remove_from_group(&db, OWNER, "G", &[a.id]).unwrap();
        let after_remove = remove_from_group(&db, OWNER, "G", &[a.id]).unwrap();
        assert!(after_remove["G"].is_empty());
    }

    #[test]
    fn delete_group_keeps_files_and_folders() {
        let db = testutil::seeded();
        let folder = folders::create_folder(&db, OWNER, "Course").unwrap();
        let a = testutil::file(&db, OWNER, "a");
        folders::move_file(&db, OWNER, a.id, Some(folder.id)).unwrap();
        create_group(&db, OWNER, "G", &[a.id]).unwrap();

        delete_group(&db, OWNER, "G").unwrap();

        assert!(list_groups(&db, OWNER).unwrap().is_empty());
        let files = file_ops::list_files(&db, OWNER, FolderFilter::All).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].folder_id, Some(folder.id));
    }

    #[test]
    fn missing_group_is_not_found() {
        let db = testutil::seeded();
        assert!(matches!(
            delete_group(&db, OWNER, "Nope"),
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            add_to_group(&db, OWNER, "Nope", &[]),
            Err(CoreError::NotFound(_))
        ));
        // Another user's group is invisible.
        create_group(&db, STUDENT, "Theirs", &[]).unwrap();
        assert!(matches!(
            delete_group(&db, OWNER, "Theirs"),
            Err(CoreError::NotFound(_))
        ));
    }

    #[test]
    fn padded_names_resolve_to_the_stored_group() {
        let db = testutil::seeded();
        let a = testutil::file(&db, OWNER, "a");

        let groups = create_group(&db, OWNER, " Exam ", &[]).unwrap();
        assert!(groups.contains_key("Exam"));

        let groups = add_to_group(&db, OWNER, "Exam ", &[a.id]).unwrap();
        assert_eq!(groups["Exam"], vec![a.id]);
        let groups = remove_from_group(&db, OWNER, " Exam", &[a.id]).unwrap();
        assert!(groups["Exam"].is_empty());

        delete_group(&db, OWNER, " Exam ").unwrap();
        assert!(list_groups(&db, OWNER).unwrap().is_empty());
    }
}
