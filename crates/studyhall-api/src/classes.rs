use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use studyhall_core::{membership, messaging};
use studyhall_types::api::{
    ChatMessageResponse, ChatMessagesResponse, Claims, ClassResponse, ClassSettingsRequest,
    ClassesResponse, CreateClassRequest, JoinClassRequest, OkResponse, PageQuery, SendChatRequest,
};
use studyhall_types::models::{ClassId, UserId};

use crate::error::ApiError;
use crate::state::{AppState, blocking};

/// GET /classes — owned and joined classes.
pub async fn list_my_classes(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let classes = blocking(&state, move |db| membership::list_my_classes(db, claims.sub)).await?;
    Ok(Json(ClassesResponse { classes }))
}

/// POST /classes
pub async fn create_class(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateClassRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let class = blocking(&state, move |db| membership::create_class(db, claims.sub, &req.name)).await?;
    Ok((StatusCode::CREATED, Json(ClassResponse { class })))
}

/// POST /classes/join
pub async fn join_class(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<JoinClassRequest>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |db| membership::join_class(db, claims.sub, &req.code)).await?;
    Ok(Json(OkResponse::ok()))
}

/// GET /classes/{class_id} — `{class, teacher, students}`.
pub async fn get_class_details(
    State(state): State<AppState>,
    Path(class_id): Path<ClassId>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let details = blocking(&state, move |db| {
        membership::get_class_details(db, claims.sub, class_id)
    })
    .await?;
    Ok(Json(details))
}

/// POST /classes/{class_id}/leave
pub async fn leave_class(
    State(state): State<AppState>,
    Path(class_id): Path<ClassId>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |db| membership::leave_class(db, claims.sub, class_id)).await?;
    Ok(Json(OkResponse::ok()))
}

/// DELETE /classes/{class_id}
pub async fn delete_class(
    State(state): State<AppState>,
    Path(class_id): Path<ClassId>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |db| membership::delete_class(db, claims.sub, class_id)).await?;
    Ok(Json(OkResponse::ok()))
}

/// PATCH /classes/{class_id}/settings
pub async fn update_settings(
    State(state): State<AppState>,
    Path(class_id): Path<ClassId>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ClassSettingsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let class = blocking(&state, move |db| {
        membership::set_allow_join(db, claims.sub, class_id, req.allow_join)
    })
    .await?;
    Ok(Json(ClassResponse { class }))
}

/// POST /classes/{class_id}/code — issue a fresh join code.
pub async fn regenerate_code(
    State(state): State<AppState>,
    Path(class_id): Path<ClassId>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let class = blocking(&state, move |db| {
        membership::regenerate_join_code(db, claims.sub, class_id)
    })
    .await?;
    Ok(Json(ClassResponse { class }))
}

/// DELETE /classes/{class_id}/members/{user_id}
pub async fn remove_member(
    State(state): State<AppState>,
    Path((class_id, user_id)): Path<(ClassId, UserId)>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |db| {
        membership::remove_member(db, claims.sub, class_id, user_id)
    })
    .await?;
    Ok(Json(OkResponse::ok()))
}

/// GET /classes/{class_id}/chat
pub async fn list_chat(
    State(state): State<AppState>,
    Path(class_id): Path<ClassId>,
    Query(query): Query<PageQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let messages = blocking(&state, move |db| {
        messaging::list_class_chat(db, claims.sub, class_id, query.limit, query.before)
    })
    .await?;
    Ok(Json(ChatMessagesResponse { messages }))
}

/// POST /classes/{class_id}/chat
pub async fn send_chat(
    State(state): State<AppState>,
    Path(class_id): Path<ClassId>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = blocking(&state, move |db| {
        messaging::send_class_chat(db, claims.sub, class_id, &req.content)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(ChatMessageResponse { message })))
}
