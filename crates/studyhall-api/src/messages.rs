use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use studyhall_core::messaging;
use studyhall_types::api::{
    Claims, MessageResponse, MessagesResponse, PageQuery, SendMessageRequest,
};
use studyhall_types::models::UserId;

use crate::error::ApiError;
use crate::state::{AppState, blocking};

/// POST /messages
pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = blocking(&state, move |db| {
        messaging::send_message(db, claims.sub, req.recipient_id, &req.content)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(MessageResponse { message })))
}

/// GET /messages/{id} — conversation with one user, newest first.
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(other_id): Path<UserId>,
    Query(query): Query<PageQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let messages = blocking(&state, move |db| {
        messaging::conversation(db, claims.sub, other_id, query.limit, query.before)
    })
    .await?;
    Ok(Json(MessagesResponse { messages }))
}

/// POST /messages/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let message = blocking(&state, move |db| {
        messaging::mark_message_read(db, message_id, claims.sub)
    })
    .await?;
    Ok(Json(MessageResponse { message }))
}

/// GET /unread — badge counts.
pub async fn unread_counts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let counts = blocking(&state, move |db| messaging::unread_counts(db, claims.sub)).await?;
    Ok(Json(counts))
}
