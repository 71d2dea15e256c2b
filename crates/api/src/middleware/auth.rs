//! Bearer-token authentication middleware.

use std::sync::Arc;

use amobagan_core::error::CoreError;
use amobagan_core::types::DbId;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::auth::Authenticator;
use crate::error::AppError;

/// Authenticated user attached to the request by [`require_auth`].
///
/// Use this as an extractor parameter in handlers mounted behind the
/// middleware:
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's id (from `claims.sub`).
    pub user_id: DbId,
    /// The user's role name.
    pub role: String,
}

/// Reject the request with 401 unless it carries a valid bearer token.
///
/// Runs to completion before the handler. On success the [`AuthUser`] is
/// stored in the request extensions.
pub async fn require_auth(
    State(authenticator): State<Arc<dyn Authenticator>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())?;
    let user = authenticator.authenticate(token)?;

    tracing::debug!(user_id = user.user_id, "Request authenticated");
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| unauthorized("Missing Authorization header"))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized("Invalid Authorization format. Expected: Bearer <token>"))?
        .trim();

    if token.is_empty() {
        return Err(unauthorized("Empty bearer token"));
    }
    Ok(token)
}

fn unauthorized(msg: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(msg.into()))
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| unauthorized("Authentication required"))
    }
}
