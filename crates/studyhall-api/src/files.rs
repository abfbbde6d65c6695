use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use studyhall_core::{files, folders};
use studyhall_types::api::{
    Claims, FileQuery, FileResponse, FilesResponse, FolderNameRequest, FolderResponse,
    FoldersResponse, MoveFileRequest, OkResponse, RegisterFileRequest,
};
use studyhall_types::models::{FileId, FolderFilter, FolderId};

use crate::error::ApiError;
use crate::state::{AppState, blocking};

// -- Files --

/// GET /files — optionally filtered by `?unfiled=true` or `?folder_id=N`.
pub async fn list_files(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = match (query.folder_id, query.unfiled) {
        (Some(id), _) => FolderFilter::Folder(id),
        (None, true) => FolderFilter::Unfiled,
        (None, false) => FolderFilter::All,
    };
    let files = blocking(&state, move |db| files::list_files(db, claims.sub, filter)).await?;
    Ok(Json(FilesResponse { files }))
}

/// POST /files — metadata for a file already placed in storage.
pub async fn register_file(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<RegisterFileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let file = blocking(&state, move |db| {
        files::register_file(db, claims.sub, &req.name, req.size)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(FileResponse { file })))
}

/// DELETE /files/{file_id}
pub async fn delete_file(
    State(state): State<AppState>,
    Path(file_id): Path<FileId>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |db| files::delete_file(db, claims.sub, file_id)).await?;
    Ok(Json(OkResponse::ok()))
}

/// PUT /files/{file_id}/folder
pub async fn move_file(
    State(state): State<AppState>,
    Path(file_id): Path<FileId>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<MoveFileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let file = blocking(&state, move |db| {
        folders::move_file(db, claims.sub, file_id, req.folder_id)
    })
    .await?;
    Ok(Json(FileResponse { file }))
}

// -- Folders --

/// GET /folders
pub async fn list_folders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let folders = blocking(&state, move |db| folders::list_folders(db, claims.sub)).await?;
    Ok(Json(FoldersResponse { folders }))
}

/// POST /folders
pub async fn create_folder(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<FolderNameRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let folder = blocking(&state, move |db| folders::create_folder(db, claims.sub, &req.name)).await?;
    Ok((StatusCode::CREATED, Json(FolderResponse { folder })))
}

/// PATCH /folders/{folder_id}
pub async fn rename_folder(
    State(state): State<AppState>,
    Path(folder_id): Path<FolderId>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<FolderNameRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let folder = blocking(&state, move |db| {
        folders::rename_folder(db, claims.sub, folder_id, &req.name)
    })
    .await?;
    Ok(Json(FolderResponse { folder }))
}

/// DELETE /folders/{folder_id}
pub async fn delete_folder(
    State(state): State<AppState>,
    Path(folder_id): Path<FolderId>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |db| folders::delete_folder(db, claims.sub, folder_id)).await?;
    Ok(Json(OkResponse::ok()))
}
