//! Authorization predicates shared by every operation.
//!
//! Ownership is always `actor == class.owner_id`; membership is always the
//! existence of a `(actor, class)` membership row. The two are never folded
//! together: an owner does not count as a member unless a read path unions
//! the two sets explicitly.

use rusqlite::Connection;

use studyhall_db::{classes, files};
use studyhall_types::models::{Class, ClassId, ClassMembership, FileId, UserFile, UserId};

use crate::{CoreError, Result};

pub fn is_owner(actor: UserId, class: &Class) -> bool {
    actor == class.owner_id
}

pub fn is_member(actor: UserId, membership: Option<&ClassMembership>) -> bool {
    membership.is_some_and(|m| m.user_id == actor)
}

pub fn is_file_owner(actor: UserId, file: &UserFile) -> bool {
    actor == file.owner_id
}

/// A class together with the actor's membership in it, fetched once.
#[derive(Debug, Clone)]
pub struct ClassAccess {
    pub actor: UserId,
    pub class: Class,
    pub membership: Option<ClassMembership>,
}

impl ClassAccess {
    pub fn load(conn: &Connection, actor: UserId, class_id: ClassId) -> Result<Self> {
        let class = classes::get(conn, class_id)?.ok_or(CoreError::NotFound("Class"))?;
        let membership = classes::membership(conn, actor, class_id)?;
        Ok(Self {
            actor,
            class,
            membership,
        })
    }

    pub fn is_owner(&self) -> bool {
        is_owner(self.actor, &self.class)
    }

    pub fn is_member(&self) -> bool {
        is_member(self.actor, self.membership.as_ref())
    }

    pub fn require_owner(&self) -> Result<()> {
        if self.is_owner() {
            Ok(())
        } else {
            Err(CoreError::Forbidden)
        }
    }

    pub fn require_owner_or_member(&self) -> Result<()> {
        if self.is_owner() || self.is_member() {
            Ok(())
        } else {
            Err(CoreError::Forbidden)
        }
    }
}

/// Fetch a file and check the actor owns it.
pub fn require_file_owner(conn: &Connection, actor: UserId, file_id: FileId) -> Result<UserFile> {
    let file = files::get(conn, file_id)?.ok_or(CoreError::NotFound("File"))?;
    if is_file_owner(actor, &file) {
        Ok(file)
    } else {
        Err(CoreError::Forbidden)
    }
}

/// Check every id in `file_ids` names a file the actor owns.
pub fn require_files_owned(conn: &Connection, actor: UserId, file_ids: &[FileId]) -> Result<()> {
    if files::all_owned(conn, actor, file_ids)? {
        Ok(())
    } else {
        Err(CoreError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[test]
    fn owner_is_not_implicitly_a_member() {
        let (db, class) = testutil::with_class();

        let access = db
            .with_conn(|conn| ClassAccess::load(conn, testutil::OWNER, class.id))
            .unwrap();
        assert!(access.is_owner());
        assert!(!access.is_member());
        assert!(access.require_owner_or_member().is_ok());
    }

    #[test]
    fn outsider_fails_both_checks() {
        let (db, class) = testutil::with_class();

        let access = db
            .with_conn(|conn| ClassAccess::load(conn, testutil::OUTSIDER, class.id))
            .unwrap();
        assert!(matches!(access.require_owner(), Err(CoreError::Forbidden)));
        assert!(matches!(
            access.require_owner_or_member(),
            Err(CoreError::Forbidden)
        ));
    }

    #[test]
    fn missing_class_is_not_found() {
        let (db, _) = testutil::with_class();
        let result = db.with_conn(|conn| ClassAccess::load(conn, testutil::OWNER, 999));
        assert!(matches!(result, Err(CoreError::NotFound(_))));
    }

    #[test]
    fn file_ownership_is_checked_per_id() {
        let db = testutil::seeded();
        let mine = testutil::file(&db, testutil::STUDENT, "mine.pdf");
        let theirs = testutil::file(&db, testutil::OWNER, "theirs.pdf");

        db.with_conn(|conn| require_files_owned(conn, testutil::STUDENT, &[mine.id, mine.id]))
            .unwrap();
        let err = db
            .with_conn(|conn| require_files_owned(conn, testutil::STUDENT, &[mine.id, theirs.id]))
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden));
    }
}
