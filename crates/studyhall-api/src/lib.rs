pub mod classes;
pub mod error;
pub mod files;
pub mod groups;
pub mod messages;
pub mod middleware;
pub mod sharing;
pub mod state;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
};

use crate::middleware::require_auth;
use crate::state::AppState;

/// Every route requires an authenticated actor.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/groups", get(groups::list_groups).post(groups::create_group))
        .route("/groups/{name}", delete(groups::delete_group))
        .route(
            "/groups/{name}/files",
            post(groups::add_files).delete(groups::remove_files),
        )
        .route("/files", get(files::list_files).post(files::register_file))
        .route("/files/{file_id}", delete(files::delete_file))
        .route("/files/{file_id}/folder", put(files::move_file))
        .route("/folders", get(files::list_folders).post(files::create_folder))
        .route(
            "/folders/{folder_id}",
            delete(files::delete_folder).patch(files::rename_folder),
        )
        .route("/classes", get(classes::list_my_classes).post(classes::create_class))
        .route("/classes/join", post(classes::join_class))
        .route(
            "/classes/{class_id}",
            get(classes::get_class_details).delete(classes::delete_class),
        )
        .route("/classes/{class_id}/leave", post(classes::leave_class))
        .route("/classes/{class_id}/settings", patch(classes::update_settings))
        .route("/classes/{class_id}/code", post(classes::regenerate_code))
        .route(
            "/classes/{class_id}/members/{user_id}",
            delete(classes::remove_member),
        )
        .route(
            "/classes/{class_id}/chat",
            get(classes::list_chat).post(classes::send_chat),
        )
        .route("/shares", post(sharing::share_file))
        .route("/shares/received", get(sharing::list_received))
        .route("/shares/sent", get(sharing::list_sent))
        .route("/shares/{share_id}/read", post(sharing::mark_read))
        .route("/messages", post(messages::send_message))
        .route("/messages/{id}", get(messages::get_conversation))
        .route("/messages/{id}/read", post(messages::mark_read))
        .route("/unread", get(messages::unread_counts))
        .layer(axum_middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
}
