use tracing::{debug, error, info};

use studyhall_db::{Database, classes, users};
use studyhall_types::models::{Class, ClassDetails, ClassId, ClassMembership, UserId};

use crate::authz::{self, ClassAccess};
use crate::codes::{MAX_CODE_ATTEMPTS, MAX_JOIN_CODE_LEN, random_join_code};
use crate::{CoreError, MAX_NAME_LEN, Result, atomically, validate_name};

const JOIN_CODE_CONSTRAINT: &str = "classes.join_code";
const MEMBERSHIP_CONSTRAINT: &str = "class_members.user_id, class_members.class_id";

pub fn create_class(db: &Database, owner_id: UserId, name: &str) -> Result<Class> {
    create_class_with(db, owner_id, name, random_join_code)
}

/// Create a class using `next_code` as the join code source. Codes are
/// claimed by inserting against the unique index; a collision draws a new
/// code, up to `MAX_CODE_ATTEMPTS` times.
pub fn create_class_with<G>(db: &Database, owner_id: UserId, name: &str, mut next_code: G) -> Result<Class>
where
    G: FnMut() -> String,
{
    let name = validate_name("Class name", name, MAX_NAME_LEN)?;

    for attempt in 1..=MAX_CODE_ATTEMPTS {
        let code = next_code();
        match db.with_conn(|conn| classes::insert(conn, owner_id, &name, &code)) {
            Ok(class) => {
                info!(class_id = class.id, owner_id, "Class created");
                return Ok(class);
            }
            Err(e) if e.is_conflict_on(JOIN_CODE_CONSTRAINT) => {
                debug!(attempt, "Join code collision, drawing another");
            }
            Err(e) => return Err(e.into()),
        }
    }

    error!(owner_id, "Gave up allocating a join code after {} attempts", MAX_CODE_ATTEMPTS);
    Err(CoreError::Internal("could not allocate a join code".into()))
}

pub fn join_class(db: &Database, user_id: UserId, code: &str) -> Result<ClassMembership> {
    let code = code.trim();
    if code.is_empty() {
        return Err(CoreError::InvalidInput("join code must not be empty".into()));
    }
    if code.chars().count() > MAX_JOIN_CODE_LEN {
        return Err(CoreError::NotFound("Class"));
    }

    db.transaction(|conn| {
        let class = classes::get_by_code(conn, code)?.ok_or(CoreError::NotFound("Class"))?;
        if !class.allow_join {
            return Err(CoreError::JoinDisabled);
        }
        if authz::is_owner(user_id, &class) {
            return Err(CoreError::AlreadyMember);
        }
        if classes::membership(conn, user_id, class.id)?.is_some() {
            return Err(CoreError::AlreadyMember);
        }

        // The unique index is the backstop if another writer got there first.
        match classes::insert_member(conn, user_id, class.id) {
            Ok(membership) => {
                info!(class_id = class.id, user_id, "Joined class");
                Ok(membership)
            }
            Err(e) if e.is_conflict_on(MEMBERSHIP_CONSTRAINT) => Err(CoreError::AlreadyMember),
            Err(e) => Err(e.into()),
        }
    })
}

/// Owners must delete their class rather than leave it. Leaving a class you
/// are not in succeeds without effect.
pub fn leave_class(db: &Database, user_id: UserId, class_id: ClassId) -> Result<()> {
    db.transaction(|conn| {
        let access = ClassAccess::load(conn, user_id, class_id)?;
        if access.is_owner() {
            return Err(CoreError::Forbidden);
        }
        if classes::delete_member(conn, user_id, class_id)? {
            info!(class_id, user_id, "Left class");
        }
        Ok(())
    })
}

/// Removes chat, then memberships, then the class, as one unit.
pub fn delete_class(db: &Database, actor_id: UserId, class_id: ClassId) -> Result<()> {
    atomically(db, |conn| {
        let access = ClassAccess::load(conn, actor_id, class_id)?;
        access.require_owner()?;

        let chat = classes::delete_all_chat(conn, class_id)?;
        let members = classes::delete_all_members(conn, class_id)?;
        classes::delete(conn, class_id)?;

        info!(class_id, members, chat, "Class deleted");
        Ok(())
    })
}

pub fn get_class_details(db: &Database, actor_id: UserId, class_id: ClassId) -> Result<ClassDetails> {
    db.with_conn(|conn| {
        let access = ClassAccess::load(conn, actor_id, class_id)?;
        access.require_owner_or_member()?;

        let teacher = users::get(conn, access.class.owner_id)?.ok_or_else(|| {
            error!(class_id, owner_id = access.class.owner_id, "Class owner missing from directory");
            CoreError::Internal("class owner missing".into())
        })?;
        let students = users::class_members(conn, class_id)?;

        Ok(ClassDetails {
            class: access.class,
            teacher,
            students,
        })
    })
}

/// Classes the user owns together with classes they have joined.
pub fn list_my_classes(db: &Database, user_id: UserId) -> Result<Vec<Class>> {
    db.with_conn(|conn| Ok(classes::list_for_user(conn, user_id)?))
}

pub fn set_allow_join(db: &Database, actor_id: UserId, class_id: ClassId, allow: bool) -> Result<Class> {
    db.transaction(|conn| {
        let mut access = ClassAccess::load(conn, actor_id, class_id)?;
        access.require_owner()?;

        classes::set_allow_join(conn, class_id, allow)?;
        access.class.allow_join = allow;
        info!(class_id, allow, "Class join setting changed");
        Ok(access.class)
    })
}

/// Owner removes a member. Removing someone who is not a member is a no-op.
pub fn remove_member(db: &Database, actor_id: UserId, class_id: ClassId, user_id: UserId) -> Result<()> {
    db.transaction(|conn| {
        let access = ClassAccess::load(conn, actor_id, class_id)?;
        access.require_owner()?;

        if classes::delete_member(conn, user_id, class_id)? {
            info!(class_id, user_id, "Member removed by owner");
        }
        Ok(())
    })
}

/// Replace the join code. The old code stops working immediately.
pub fn regenerate_join_code(db: &Database, actor_id: UserId, class_id: ClassId) -> Result<Class> {
    regenerate_join_code_with(db, actor_id, class_id, random_join_code)
}

/// Each attempt re-checks ownership and writes in one transaction, so a class
/// deleted in between surfaces as `NotFound` rather than a silent success.
pub fn regenerate_join_code_with<G>(
    db: &Database,
    actor_id: UserId,
    class_id: ClassId,
    mut next_code: G,
) -> Result<Class>
where
    G: FnMut() -> String,
{
    for attempt in 1..=MAX_CODE_ATTEMPTS {
        let code = next_code();
        let claimed = db.transaction(|conn| {
            let mut access = ClassAccess::load(conn, actor_id, class_id)?;
            access.require_owner()?;

            match classes::set_join_code(conn, class_id, &code) {
                Ok(true) => {
                    access.class.join_code = code.clone();
                    Ok(Some(access.class))
                }
                Ok(false) => Err(CoreError::NotFound("Class")),
                Err(e) if e.is_conflict_on(JOIN_CODE_CONSTRAINT) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })?;

        match claimed {
            Some(class) => {
                info!(class_id, "Join code regenerated");
                return Ok(class);
            }
            None => debug!(attempt, "Join code collision, drawing another"),
        }
    }

    error!(class_id, "Gave up allocating a join code after {} attempts", MAX_CODE_ATTEMPTS);
    Err(CoreError::Internal("could not allocate a join code".into()))
}
