use rusqlite::{Connection, OptionalExtension, params};

use studyhall_types::models::{FileId, SharedFile, UserId};

use crate::Result;
use crate::rows::{now, opt_timestamp, timestamp};

const SHARE_COLUMNS: &str = "id, sender_id, recipient_id, original_file_id, shared_file_name, \
                             description, shared_at, is_read, read_at";

pub fn insert(
    conn: &Connection,
    sender_id: UserId,
    recipient_id: UserId,
    file_id: FileId,
    name: &str,
    description: Option<&str>,
) -> Result<SharedFile> {
    conn.execute(
        "INSERT INTO shared_files
            (sender_id, recipient_id, original_file_id, shared_file_name, description, shared_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![sender_id, recipient_id, file_id, name, description, now()],
    )?;
    let id = conn.last_insert_rowid();
    get(conn, id)?.ok_or(crate::DbError::NotFound)
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<SharedFile>> {
    let share = conn
        .query_row(
            &format!("SELECT {SHARE_COLUMNS} FROM shared_files WHERE id = ?1"),
            [id],
            row_to_share,
        )
        .optional()?;
    Ok(share)
}

pub fn list_received(conn: &Connection, recipient_id: UserId) -> Result<Vec<SharedFile>> {
    list_by(conn, "recipient_id", recipient_id)
}

pub fn list_sent(conn: &Connection, sender_id: UserId) -> Result<Vec<SharedFile>> {
    list_by(conn, "sender_id", sender_id)
}

fn list_by(conn: &Connection, column: &str, user_id: UserId) -> Result<Vec<SharedFile>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SHARE_COLUMNS} FROM shared_files WHERE {column} = ?1 ORDER BY id DESC"
    ))?;
    let rows = stmt
        .query_map([user_id], row_to_share)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Flips the read flag once. Returns false if it was already read.
pub fn mark_read(conn: &Connection, id: i64) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE shared_files SET is_read = 1, read_at = ?2 WHERE id = ?1 AND is_read = 0",
        params![id, now()],
    )?;
    Ok(affected > 0)
}

pub fn count_unread(conn: &Connection, recipient_id: UserId) -> Result<u64> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM shared_files WHERE recipient_id = ?1 AND is_read = 0",
        [recipient_id],
        |r| r.get(0),
    )?;
    Ok(n as u64)
}

pub fn delete_for_file(conn: &Connection, file_id: FileId) -> Result<usize> {
    Ok(conn.execute(
        "DELETE FROM shared_files WHERE original_file_id = ?1",
        [file_id],
    )?)
}

fn row_to_share(row: &rusqlite::Row<'_>) -> rusqlite::Result<SharedFile> {
    Ok(SharedFile {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        recipient_id: row.get(2)?,
        original_file_id: row.get(3)?,
        shared_file_name: row.get(4)?,
        description: row.get(5)?,
        shared_at: timestamp(row, 6)?,
        is_read: row.get(7)?,
        read_at: opt_timestamp(row, 8)?,
    })
}
