use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use studyhall_core::CoreError;
use studyhall_types::api::ErrorResponse;

/// HTTP face of a domain error.
#[derive(Debug)]
pub struct ApiError(pub CoreError);

impl ApiError {
    pub fn internal() -> Self {
        Self(CoreError::Internal("request could not be completed".into()))
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            CoreError::Unauthorized => StatusCode::UNAUTHORIZED,
            CoreError::Forbidden => StatusCode::FORBIDDEN,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Conflict(_) | CoreError::AlreadyMember => StatusCode::CONFLICT,
            CoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CoreError::JoinDisabled => StatusCode::FORBIDDEN,
            CoreError::Internal(_) | CoreError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            CoreError::Internal(_) | CoreError::Store(_) => {
                error!("Request failed: {}", self.0);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
