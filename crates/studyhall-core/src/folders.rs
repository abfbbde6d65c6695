//! Folders: exclusive, one-level containers. A file sits in at most one
//! folder. Folders and file groups are independent of each other.

use tracing::info;

use studyhall_db::{Database, DbError, files, folders};
use studyhall_types::models::{FileId, Folder, FolderId, UserFile, UserId};

use crate::authz;
use crate::{CoreError, MAX_NAME_LEN, Result, atomically, validate_name};

const FOLDER_NAME_CONSTRAINT: &str = "folders.user_id, folders.name";

pub fn create_folder(db: &Database, user_id: UserId, name: &str) -> Result<Folder> {
    let name = validate_name("Folder name", name, MAX_NAME_LEN)?;
    match db.with_conn(|conn| folders::insert(conn, user_id, &name)) {
        Ok(folder) => {
            info!(folder_id = folder.id, user_id, "Folder created");
            Ok(folder)
        }
        Err(e) if e.is_conflict_on(FOLDER_NAME_CONSTRAINT) => Err(CoreError::Conflict("Folder")),
        Err(e) => Err(e.into()),
    }
}

pub fn list_folders(db: &Database, user_id: UserId) -> Result<Vec<Folder>> {
    db.with_conn(|conn| Ok(folders::list_for_user(conn, user_id)?))
}

pub fn rename_folder(db: &Database, user_id: UserId, folder_id: FolderId, name: &str) -> Result<Folder> {
    let name = validate_name("Folder name", name, MAX_NAME_LEN)?;
    db.transaction(|conn| {
        let mut folder = owned_folder(conn, user_id, folder_id)?;
        folders::rename(conn, folder_id, &name).map_err(|e| match e {
            DbError::Conflict(_) => CoreError::Conflict("Folder"),
            other => other.into(),
        })?;
        folder.name = name.clone();
        Ok(folder)
    })
}

/// Contained files move back to unfiled before the folder row goes away.
pub fn delete_folder(db: &Database, user_id: UserId, folder_id: FolderId) -> Result<()> {
    atomically(db, |conn| {
        owned_folder(conn, user_id, folder_id)?;

        let unfiled = folders::clear_files(conn, folder_id)?;
        folders::delete(conn, folder_id)?;

        info!(folder_id, unfiled, "Folder deleted");
        Ok(())
    })
}

/// Put a file in a folder, or take it out with `None`.
pub fn move_file(
    db: &Database,
    user_id: UserId,
    file_id: FileId,
    folder_id: Option<FolderId>,
) -> Result<UserFile> {
    db.transaction(|conn| {
        let mut file = authz::require_file_owner(conn, user_id, file_id)?;
        if let Some(folder_id) = folder_id {
            owned_folder(conn, user_id, folder_id)?;
        }

        files::set_folder(conn, file_id, folder_id)?;
        file.folder_id = folder_id;
        Ok(file)
    })
}

fn owned_folder(conn: &rusqlite::Connection, user_id: UserId, folder_id: FolderId) -> Result<Folder> {
    let folder = folders::get(conn, folder_id)?.ok_or(CoreError::NotFound("Folder"))?;
    if folder.user_id != user_id {
        return Err(CoreError::Forbidden);
    }
    Ok(folder)
}
