//! Authentication primitives.
//!
//! - [`jwt`] -- JWT access-token generation and validation.
//! - [`Authenticator`] -- the token check the auth middleware delegates to.

pub mod jwt;

use amobagan_core::error::CoreError;

use crate::middleware::auth::AuthUser;
use jwt::{validate_token, JwtConfig};

/// Turns a bearer token into an authenticated user.
///
/// The auth middleware and the streaming WebSocket only depend on this trait,
/// so routers can be built with any token scheme (and tests can swap in
/// a fixed secret).
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, token: &str) -> Result<AuthUser, CoreError>;
}

/// Verifies HS256 access tokens.
pub struct JwtAuthenticator {
    config: JwtConfig,
}

impl JwtAuthenticator {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }
}

impl Authenticator for JwtAuthenticator {
    fn authenticate(&self, token: &str) -> Result<AuthUser, CoreError> {
        let claims = validate_token(token, &self.config).map_err(|e| {
            tracing::debug!(error = %e, "Rejected access token");
            CoreError::Unauthorized("Invalid or expired token".into())
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}
