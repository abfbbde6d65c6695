use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::debug;

use studyhall_core::CoreError;
use studyhall_db::users;
use studyhall_types::api::Claims;

use crate::error::ApiError;
use crate::state::{AppState, blocking};

/// Validate the bearer JWT and attach its `Claims` to the request. The user
/// is mirrored into the local directory so others can address them.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError(CoreError::Unauthorized))?;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        debug!("Rejected token: {}", e);
        ApiError(CoreError::Unauthorized)
    })?
    .claims;

    let (id, username) = (claims.sub, claims.username.clone());
    blocking(&state, move |db| {
        db.with_conn(|conn| users::upsert(conn, id, &username))
            .map_err(CoreError::from)
    })
    .await?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
