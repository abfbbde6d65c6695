use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use studyhall_core::sharing;
use studyhall_types::api::{Claims, ShareFileRequest, SharedFileResponse, SharedFilesResponse};

use crate::error::ApiError;
use crate::state::{AppState, blocking};

/// POST /shares
pub async fn share_file(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ShareFileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let shared_file = blocking(&state, move |db| {
        sharing::share_file(
            db,
            claims.sub,
            req.recipient_id,
            req.file_id,
            &req.name,
            req.description.as_deref(),
        )
    })
    .await?;
    Ok((StatusCode::CREATED, Json(SharedFileResponse { shared_file })))
}

/// GET /shares/received
pub async fn list_received(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let shared_files = blocking(&state, move |db| sharing::list_received(db, claims.sub)).await?;
    Ok(Json(SharedFilesResponse { shared_files }))
}

/// GET /shares/sent
pub async fn list_sent(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let shared_files = blocking(&state, move |db| sharing::list_sent(db, claims.sub)).await?;
    Ok(Json(SharedFilesResponse { shared_files }))
}

/// POST /shares/{share_id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    Path(share_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let shared_file = blocking(&state, move |db| {
        sharing::mark_share_read(db, share_id, claims.sub)
    })
    .await?;
    Ok(Json(SharedFileResponse { shared_file }))
}
