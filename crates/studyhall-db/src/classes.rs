use rusqlite::{Connection, OptionalExtension, params};

use studyhall_types::models::{Class, ClassChatMessage, ClassId, ClassMembership, UserId};

use crate::Result;
use crate::rows::{now, timestamp};

const CLASS_COLUMNS: &str = "id, name, join_code, owner_id, allow_join, created_at";

// -- Classes --

/// Insert a class. A taken join code surfaces as `DbError::Conflict("classes.join_code")`.
pub fn insert(conn: &Connection, owner_id: UserId, name: &str, join_code: &str) -> Result<Class> {
    conn.execute(
        "INSERT INTO classes (name, join_code, owner_id, allow_join, created_at)
         VALUES (?1, ?2, ?3, 1, ?4)",
        params![name, join_code, owner_id, now()],
    )?;
    let id = conn.last_insert_rowid();
    get(conn, id)?.ok_or(crate::DbError::NotFound)
}

pub fn get(conn: &Connection, id: ClassId) -> Result<Option<Class>> {
    let class = conn
        .query_row(
            &format!("SELECT {CLASS_COLUMNS} FROM classes WHERE id = ?1"),
            [id],
            row_to_class,
        )
        .optional()?;
    Ok(class)
}

/// Join codes are case-sensitive; SQLite's default BINARY collation keeps them so.
pub fn get_by_code(conn: &Connection, join_code: &str) -> Result<Option<Class>> {
    let class = conn
        .query_row(
            &format!("SELECT {CLASS_COLUMNS} FROM classes WHERE join_code = ?1"),
            [join_code],
            row_to_class,
        )
        .optional()?;
    Ok(class)
}

/// Classes the user owns or has joined, oldest first.
pub fn list_for_user(conn: &Connection, user_id: UserId) -> Result<Vec<Class>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CLASS_COLUMNS} FROM classes
         WHERE owner_id = ?1
            OR id IN (SELECT class_id FROM class_members WHERE user_id = ?1)
         ORDER BY id ASC"
    ))?;
    let rows = stmt
        .query_map([user_id], row_to_class)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn set_allow_join(conn: &Connection, id: ClassId, allow: bool) -> Result<()> {
    conn.execute(
        "UPDATE classes SET allow_join = ?2 WHERE id = ?1",
        params![id, allow],
    )?;
    Ok(())
}

/// False if no class has `id`.
pub fn set_join_code(conn: &Connection, id: ClassId, join_code: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE classes SET join_code = ?2 WHERE id = ?1",
        params![id, join_code],
    )?;
    Ok(affected > 0)
}

/// Deletes only the class row. Callers remove children first inside the
/// same transaction; the ON DELETE CASCADE clauses catch anything missed.
pub fn delete(conn: &Connection, id: ClassId) -> Result<bool> {
    let affected = conn.execute("DELETE FROM classes WHERE id = ?1", [id])?;
    Ok(affected > 0)
}

// -- Memberships --

/// Insert a membership. A duplicate pair surfaces as
/// `DbError::Conflict("class_members.user_id, class_members.class_id")`.
pub fn insert_member(conn: &Connection, user_id: UserId, class_id: ClassId) -> Result<ClassMembership> {
    let joined_at = now();
    conn.execute(
        "INSERT INTO class_members (user_id, class_id, joined_at) VALUES (?1, ?2, ?3)",
        params![user_id, class_id, joined_at],
    )?;
    let id = conn.last_insert_rowid();
    membership(conn, user_id, class_id)?
        .filter(|m| m.id == id)
        .ok_or(crate::DbError::NotFound)
}

pub fn membership(
    conn: &Connection,
    user_id: UserId,
    class_id: ClassId,
) -> Result<Option<ClassMembership>> {
    let row = conn
        .query_row(
            "SELECT id, user_id, class_id, joined_at FROM class_members
             WHERE user_id = ?1 AND class_id = ?2",
            params![user_id, class_id],
            |row| {
                Ok(ClassMembership {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    class_id: row.get(2)?,
                    joined_at: timestamp(row, 3)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

pub fn delete_member(conn: &Connection, user_id: UserId, class_id: ClassId) -> Result<bool> {
    let affected = conn.execute(
        "DELETE FROM class_members WHERE user_id = ?1 AND class_id = ?2",
        params![user_id, class_id],
    )?;
    Ok(affected > 0)
}

pub fn delete_all_members(conn: &Connection, class_id: ClassId) -> Result<usize> {
    Ok(conn.execute("DELETE FROM class_members WHERE class_id = ?1", [class_id])?)
}

pub fn count_members(conn: &Connection, class_id: ClassId) -> Result<u64> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM class_members WHERE class_id = ?1",
        [class_id],
        |r| r.get(0),
    )?;
    Ok(n as u64)
}

// -- Chat --

pub fn insert_chat(
    conn: &Connection,
    class_id: ClassId,
    sender_id: UserId,
    content: &str,
) -> Result<ClassChatMessage> {
    let sent_at = now();
    conn.execute(
        "INSERT INTO class_messages (class_id, sender_id, content, sent_at) VALUES (?1, ?2, ?3, ?4)",
        params![class_id, sender_id, content, sent_at],
    )?;
    let id = conn.last_insert_rowid();
    let msg = conn.query_row(
        "SELECT id, class_id, sender_id, content, sent_at FROM class_messages WHERE id = ?1",
        [id],
        row_to_chat,
    )?;
    Ok(msg)
}

/// Newest first. `before` is an exclusive id cursor.
pub fn list_chat(
    conn: &Connection,
    class_id: ClassId,
    limit: u32,
    before: Option<i64>,
) -> Result<Vec<ClassChatMessage>> {
    let mut stmt = conn.prepare(
        "SELECT id, class_id, sender_id, content, sent_at FROM class_messages
         WHERE class_id = ?1 AND (?2 IS NULL OR id < ?2)
         ORDER BY id DESC
         LIMIT ?3",
    )?;
    let rows = stmt
        .query_map(params![class_id, before, limit], row_to_chat)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn delete_all_chat(conn: &Connection, class_id: ClassId) -> Result<usize> {
    Ok(conn.execute("DELETE FROM class_messages WHERE class_id = ?1", [class_id])?)
}

pub fn count_chat(conn: &Connection, class_id: ClassId) -> Result<u64> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM class_messages WHERE class_id = ?1",
        [class_id],
        |r| r.get(0),
    )?;
    Ok(n as u64)
}

fn row_to_class(row: &rusqlite::Row<'_>) -> rusqlite::Result<Class> {
    Ok(Class {
        id: row.get(0)?,
        name: row.get(1)?,
        join_code: row.get(2)?,
        owner_id: row.get(3)?,
        allow_join: row.get(4)?,
        created_at: timestamp(row, 5)?,
    })
}

fn row_to_chat(row: &rusqlite::Row<'_>) -> rusqlite::Result<ClassChatMessage> {
    Ok(ClassChatMessage {
        id: row.get(0)?,
        class_id: row.get(1)?,
        sender_id: row.get(2)?,
        content: row.get(3)?,
        sent_at: timestamp(row, 4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbError, users};

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            users::upsert(conn, 1, "owner")?;
            users::upsert(conn, 2, "student")
        })
        .unwrap();
        db
    }

    #[test]
    fn duplicate_join_code_is_a_conflict() {
        let db = seeded();
        db.with_conn(|conn| insert(conn, 1, "Bio", "ABCD1234")).unwrap();

        let err = db
            .with_conn(|conn| insert(conn, 1, "Chem", "ABCD1234"))
            .unwrap_err();
        assert!(err.is_conflict_on("classes.join_code"), "got {err:?}");
    }

    #[test]
    fn set_join_code_reports_missing_class() {
        let db = seeded();
        let class = db.with_conn(|conn| insert(conn, 1, "Bio", "OLD")).unwrap();

        assert!(db.with_conn(|conn| set_join_code(conn, class.id, "NEW")).unwrap());
        assert!(!db.with_conn(|conn| set_join_code(conn, class.id + 1, "OTHER")).unwrap());
        let found = db.with_conn(|conn| get_by_code(conn, "NEW")).unwrap();
        assert_eq!(found.map(|c| c.id), Some(class.id));
    }

    #[test]
    fn join_codes_are_case_sensitive() {
        let db = seeded();
        db.with_conn(|conn| insert(conn, 1, "Bio", "abcd")).unwrap();
        let found = db.with_conn(|conn| get_by_code(conn, "ABCD")).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn duplicate_membership_is_a_conflict() {
        let db = seeded();
        let class = db.with_conn(|conn| insert(conn, 1, "Bio", "CODE")).unwrap();
        db.with_conn(|conn| insert_member(conn, 2, class.id)).unwrap();

        let err = db
            .with_conn(|conn| insert_member(conn, 2, class.id))
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
        assert!(err.is_conflict_on("class_members.user_id"));
    }

    #[test]
    fn deleting_class_cascades_to_children() {
        let db = seeded();
        let class = db.with_conn(|conn| insert(conn, 1, "Bio", "CODE")).unwrap();
        db.with_conn(|conn| {
            insert_member(conn, 2, class.id)?;
            insert_chat(conn, class.id, 2, "hi")
        })
        .unwrap();

        // Raw delete without clearing children: the FK cascade still applies.
        assert!(db.with_conn(|conn| delete(conn, class.id)).unwrap());
        assert_eq!(db.with_conn(|conn| count_members(conn, class.id)).unwrap(), 0);
        assert_eq!(db.with_conn(|conn| count_chat(conn, class.id)).unwrap(), 0);
    }

    #[test]
    fn list_for_user_unions_owned_and_joined() {
        let db = seeded();
        let owned = db.with_conn(|conn| insert(conn, 2, "Mine", "C1")).unwrap();
        let joined = db.with_conn(|conn| insert(conn, 1, "Theirs", "C2")).unwrap();
        db.with_conn(|conn| insert(conn, 1, "Other", "C3")).unwrap();
        db.with_conn(|conn| insert_member(conn, 2, joined.id)).unwrap();

        let ids: Vec<_> = db
            .with_conn(|conn| list_for_user(conn, 2))
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![owned.id, joined.id]);
    }

    #[test]
    fn chat_pages_newest_first() {
        let db = seeded();
        let class = db.with_conn(|conn| insert(conn, 1, "Bio", "CODE")).unwrap();
        for i in 0..5 {
            db.with_conn(|conn| insert_chat(conn, class.id, 1, &format!("m{i}")))
                .unwrap();
        }

        let page = db.with_conn(|conn| list_chat(conn, class.id, 2, None)).unwrap();
        assert_eq!(page[0].content, "m4");
        assert_eq!(page[1].content, "m3");

        let older = db
            .with_conn(|conn| list_chat(conn, class.id, 10, Some(page[1].id)))
            .unwrap();
        assert_eq!(older.len(), 3);
        assert_eq!(older[0].content, "m2");
    }
}
