use rusqlite::{Connection, OptionalExtension, params};

use studyhall_types::models::{User, UserId};

use crate::Result;
use crate::rows::{now, timestamp};

/// Record an externally authenticated user. Keeps the first `created_at`,
/// refreshes the display name.
pub fn upsert(conn: &Connection, id: UserId, username: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, username, created_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET username = excluded.username",
        params![id, username, now()],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: UserId) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, username, created_at FROM users WHERE id = ?1",
            [id],
            row_to_user,
        )
        .optional()?;
    Ok(user)
}

pub fn exists(conn: &Connection, id: UserId) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM users WHERE id = ?1", [id], |r| r.get(0))
        .optional()?;
    Ok(found.is_some())
}

/// Members of a class, in join order. The owner is not included unless they
/// also hold a membership row.
pub fn class_members(conn: &Connection, class_id: i64) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(
        "SELECT u.id, u.username, u.created_at
         FROM class_members m
         JOIN users u ON u.id = m.user_id
         WHERE m.class_id = ?1
         ORDER BY m.id ASC",
    )?;
    let rows = stmt
        .query_map([class_id], row_to_user)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        created_at: timestamp(row, 2)?,
    })
}
