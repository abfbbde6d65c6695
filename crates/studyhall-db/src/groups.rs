use rusqlite::{Connection, OptionalExtension, params};

use studyhall_types::models::{FileGroups, FileId, UserId};

use crate::Result;

/// All groups for a user, empty ones included. Ids within a group are sorted.
pub fn list(conn: &Connection, user_id: UserId) -> Result<FileGroups> {
    let mut groups = FileGroups::new();

    let mut stmt = conn.prepare(
        "SELECT g.name, i.file_id
         FROM file_groups g
         LEFT JOIN file_group_items i ON i.group_id = g.id
         WHERE g.user_id = ?1
         ORDER BY g.name ASC, i.file_id ASC",
    )?;
    let rows = stmt.query_map([user_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, Option<FileId>>(1)?))
    })?;

    for row in rows {
        let (name, file_id) = row?;
        let entry = groups.entry(name).or_default();
        if let Some(id) = file_id {
            entry.push(id);
        }
    }

    Ok(groups)
}

pub fn find(conn: &Connection, user_id: UserId, name: &str) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT id FROM file_groups WHERE user_id = ?1 AND name = ?2",
            params![user_id, name],
            |r| r.get(0),
        )
        .optional()?;
    Ok(id)
}

/// A name already used by this user surfaces as
/// `DbError::Conflict("file_groups.user_id, file_groups.name")`.
pub fn insert(conn: &Connection, user_id: UserId, name: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO file_groups (user_id, name) VALUES (?1, ?2)",
        params![user_id, name],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Already-present ids are ignored. Returns how many were newly added.
pub fn add_items(conn: &Connection, group_id: i64, file_ids: &[FileId]) -> Result<usize> {
    let mut stmt = conn
        .prepare("INSERT OR IGNORE INTO file_group_items (group_id, file_id) VALUES (?1, ?2)")?;
    let mut added = 0;
    for id in file_ids {
        added += stmt.execute(params![group_id, id])?;
    }
    Ok(added)
}

/// Absent ids are ignored. Returns how many were removed.
pub fn remove_items(conn: &Connection, group_id: i64, file_ids: &[FileId]) -> Result<usize> {
    let mut stmt =
        conn.prepare("DELETE FROM file_group_items WHERE group_id = ?1 AND file_id = ?2")?;
    let mut removed = 0;
    for id in file_ids {
        removed += stmt.execute(params![group_id, id])?;
    }
    Ok(removed)
}

/// Removes the grouping record and its item links. Files are untouched.
pub fn delete(conn: &Connection, group_id: i64) -> Result<bool> {
    let affected = conn.execute("DELETE FROM file_groups WHERE id = ?1", [group_id])?;
    Ok(affected > 0)
}
