use axum::{extract::Request, middleware::Next, response::Response};

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;

/// Staff gate for elevated routes. Must run after `jwt_auth_middleware`.
pub async fn require_staff_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.is_staff {
        tracing::warn!("User {} denied access to {}", user.username, request.uri().path());
        return Err(ApiError::forbidden("Staff privileges required"));
    }

    Ok(next.run(request).await)
}
