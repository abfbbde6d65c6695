use rusqlite::{Connection, OptionalExtension, params};

use studyhall_types::models::{Folder, FolderId, UserId};

use crate::Result;
use crate::rows::{now, timestamp};

pub fn insert(conn: &Connection, user_id: UserId, name: &str) -> Result<Folder> {
    conn.execute(
        "INSERT INTO folders (name, user_id, created_at) VALUES (?1, ?2, ?3)",
        params![name, user_id, now()],
    )?;
    let id = conn.last_insert_rowid();
    get(conn, id)?.ok_or(crate::DbError::NotFound)
}

pub fn get(conn: &Connection, id: FolderId) -> Result<Option<Folder>> {
    let folder = conn
        .query_row(
            "SELECT id, name, user_id, created_at FROM folders WHERE id = ?1",
            [id],
            row_to_folder,
        )
        .optional()?;
    Ok(folder)
}

pub fn list_for_user(conn: &Connection, user_id: UserId) -> Result<Vec<Folder>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, user_id, created_at FROM folders WHERE user_id = ?1 ORDER BY name ASC",
    )?;
    let rows = stmt
        .query_map([user_id], row_to_folder)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn rename(conn: &Connection, id: FolderId, name: &str) -> Result<()> {
    conn.execute(
        "UPDATE folders SET name = ?2 WHERE id = ?1",
        params![id, name],
    )?;
    Ok(())
}

/// Moves every file in the folder back to unfiled. Returns how many moved.
pub fn clear_files(conn: &Connection, id: FolderId) -> Result<usize> {
    Ok(conn.execute("UPDATE files SET folder_id = NULL WHERE folder_id = ?1", [id])?)
}

/// Fails with a foreign-key error if any file still points at the folder.
pub fn delete(conn: &Connection, id: FolderId) -> Result<bool> {
    let affected = conn.execute("DELETE FROM folders WHERE id = ?1", [id])?;
    Ok(affected > 0)
}

fn row_to_folder(row: &rusqlite::Row<'_>) -> rusqlite::Result<Folder> {
    Ok(Folder {
        id: row.get(0)?,
        name: row.get(1)?,
        user_id: row.get(2)?,
        created_at: timestamp(row, 3)?,
    })
}
