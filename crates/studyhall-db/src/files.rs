use rusqlite::{Connection, OptionalExtension, params};

use studyhall_types::models::{FileId, FolderFilter, FolderId, UserFile, UserId};

use crate::Result;
use crate::rows::{now, timestamp};

const FILE_COLUMNS: &str = "id, owner_id, name, size, folder_id, uploaded_at";

pub fn insert(conn: &Connection, owner_id: UserId, name: &str, size: i64) -> Result<UserFile> {
    conn.execute(
        "INSERT INTO files (owner_id, name, size, uploaded_at) VALUES (?1, ?2, ?3, ?4)",
        params![owner_id, name, size, now()],
    )?;
    let id = conn.last_insert_rowid();
    get(conn, id)?.ok_or(crate::DbError::NotFound)
}

pub fn get(conn: &Connection, id: FileId) -> Result<Option<UserFile>> {
    let file = conn
        .query_row(
            &format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ?1"),
            [id],
            row_to_file,
        )
        .optional()?;
    Ok(file)
}

pub fn list_for_user(conn: &Connection, owner_id: UserId, filter: FolderFilter) -> Result<Vec<UserFile>> {
    let (clause, folder) = match filter {
        FolderFilter::All => ("", None),
        FolderFilter::Unfiled => ("AND folder_id IS NULL", None),
        FolderFilter::Folder(id) => ("AND folder_id = ?2", Some(id)),
    };
    let sql = format!(
        "SELECT {FILE_COLUMNS} FROM files WHERE owner_id = ?1 {clause} ORDER BY id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = match folder {
        Some(folder_id) => stmt
            .query_map(params![owner_id, folder_id], row_to_file)?
            .collect::<std::result::Result<Vec<_>, _>>()?,
        None => stmt
            .query_map([owner_id], row_to_file)?
            .collect::<std::result::Result<Vec<_>, _>>()?,
    };
    Ok(rows)
}

/// True if every id in `ids` names a file owned by `owner_id`. Duplicate ids
/// are checked once; an empty list is trivially owned.
pub fn all_owned(conn: &Connection, owner_id: UserId, ids: &[FileId]) -> Result<bool> {
    let mut unique = ids.to_vec();
    unique.sort_unstable();
    unique.dedup();

    let mut stmt = conn.prepare("SELECT 1 FROM files WHERE id = ?1 AND owner_id = ?2")?;
    for id in unique {
        if !stmt.exists(params![id, owner_id])? {
            return Ok(false);
        }
    }
    Ok(true)
}

pub fn set_folder(conn: &Connection, id: FileId, folder_id: Option<FolderId>) -> Result<()> {
    conn.execute(
        "UPDATE files SET folder_id = ?2 WHERE id = ?1",
        params![id, folder_id],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, id: FileId) -> Result<bool> {
    let affected = conn.execute("DELETE FROM files WHERE id = ?1", [id])?;
    Ok(affected > 0)
}

fn row_to_file(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserFile> {
    Ok(UserFile {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        size: row.get(3)?,
        folder_id: row.get(4)?,
        uploaded_at: timestamp(row, 5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, users};

    #[test]
    fn all_owned_ignores_duplicates_and_rejects_foreign_ids() {
        let db = Database::open_in_memory().unwrap();
        let (mine, theirs) = db
            .with_conn(|conn| {
                users::upsert(conn, 1, "ada")?;
                users::upsert(conn, 2, "bob")?;
                let mine = insert(conn, 1, "a", 1)?;
                let theirs = insert(conn, 2, "b", 1)?;
                Ok::<_, crate::DbError>((mine, theirs))
            })
            .unwrap();

        db.with_conn(|conn| {
            assert!(all_owned(conn, 1, &[mine.id, mine.id])?);
            assert!(all_owned(conn, 1, &[])?);
            assert!(!all_owned(conn, 1, &[mine.id, theirs.id])?);
            assert!(!all_owned(conn, 1, &[999])?);
            Ok::<_, crate::DbError>(())
        })
        .unwrap();
    }
}
