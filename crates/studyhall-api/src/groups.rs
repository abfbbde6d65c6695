use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use studyhall_core::grouping;
use studyhall_types::api::{
    Claims, CreateGroupRequest, GroupFilesRequest, GroupsResponse, OkResponse,
};

use crate::error::ApiError;
use crate::state::{AppState, blocking};

/// GET /groups
pub async fn list_groups(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let groups = blocking(&state, move |db| grouping::list_groups(db, claims.sub)).await?;
    Ok(Json(GroupsResponse { groups }))
}

/// POST /groups
pub async fn create_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let groups = blocking(&state, move |db| {
        grouping::create_group(db, claims.sub, &req.name, &req.file_ids)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(GroupsResponse { groups })))
}

/// DELETE /groups/{name}
pub async fn delete_group(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |db| grouping::delete_group(db, claims.sub, &name)).await?;
    Ok(Json(OkResponse::ok()))
}

/// POST /groups/{name}/files
pub async fn add_files(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<GroupFilesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let groups = blocking(&state, move |db| {
        grouping::add_to_group(db, claims.sub, &name, &req.file_ids)
    })
    .await?;
    Ok(Json(GroupsResponse { groups }))
}

/// DELETE /groups/{name}/files
pub async fn remove_files(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<GroupFilesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let groups = blocking(&state, move |db| {
        grouping::remove_from_group(db, claims.sub, &name, &req.file_ids)
    })
    .await?;
    Ok(Json(GroupsResponse { groups }))
}
