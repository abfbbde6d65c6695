use rusqlite::{Connection, OptionalExtension, params};

use studyhall_types::models::{Message, UserId};

use crate::Result;
use crate::rows::{now, opt_timestamp, timestamp};

const MESSAGE_COLUMNS: &str = "id, sender_id, recipient_id, content, sent_at, is_read, read_at";

pub fn insert(conn: &Connection, sender_id: UserId, recipient_id: UserId, content: &str) -> Result<Message> {
    conn.execute(
        "INSERT INTO messages (sender_id, recipient_id, content, sent_at) VALUES (?1, ?2, ?3, ?4)",
        params![sender_id, recipient_id, content, now()],
    )?;
    let id = conn.last_insert_rowid();
    get(conn, id)?.ok_or(crate::DbError::NotFound)
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<Message>> {
    let msg = conn
        .query_row(
            &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
            [id],
            row_to_message,
        )
        .optional()?;
    Ok(msg)
}

/// Both directions between two users, newest first.
pub fn conversation(
    conn: &Connection,
    user_id: UserId,
    other_id: UserId,
    limit: u32,
    before: Option<i64>,
) -> Result<Vec<Message>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages
         WHERE ((sender_id = ?1 AND recipient_id = ?2) OR (sender_id = ?2 AND recipient_id = ?1))
           AND (?3 IS NULL OR id < ?3)
         ORDER BY id DESC
         LIMIT ?4"
    ))?;
    let rows = stmt
        .query_map(params![user_id, other_id, before, limit], row_to_message)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Flips the read flag once. Returns false if it was already read.
pub fn mark_read(conn: &Connection, id: i64) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE messages SET is_read = 1, read_at = ?2 WHERE id = ?1 AND is_read = 0",
        params![id, now()],
    )?;
    Ok(affected > 0)
}

pub fn count_unread(conn: &Connection, recipient_id: UserId) -> Result<u64> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM messages WHERE recipient_id = ?1 AND is_read = 0",
        [recipient_id],
        |r| r.get(0),
    )?;
    Ok(n as u64)
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        recipient_id: row.get(2)?,
        content: row.get(3)?,
        sent_at: timestamp(row, 4)?,
        is_read: row.get(5)?,
        read_at: opt_timestamp(row, 6)?,
    })
}
