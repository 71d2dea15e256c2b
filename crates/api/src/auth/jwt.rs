//! HS256 access tokens.
//!
//! Tokens are minted by the account service; this server only verifies them.
//! [`generate_access_token`] is kept for local tooling and the test suite.

use amobagan_core::types::DbId;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{parse_env, ConfigError};

/// Payload of an access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id.
    pub sub: DbId,
    pub role: String,
    /// Expiry, UTC Unix seconds.
    pub exp: i64,
    /// Issued at, UTC Unix seconds.
    pub iat: i64,
    /// Token id (UUID v4).
    pub jti: String,
}

impl Claims {
    /// Claims for `user_id` valid for `ttl` from now. A negative `ttl` yields
    /// an already expired token.
    pub fn for_user(user_id: DbId, role: &str, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            role: role.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }
}

/// Token signing settings.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared HMAC secret.
    pub secret: String,
    /// Lifetime of tokens minted by [`generate_access_token`].
    pub access_token_expiry_mins: i64,
}

impl JwtConfig {
    /// `JWT_SECRET` (required, non-empty) and `JWT_ACCESS_EXPIRY_MINS`
    /// (default `15`).
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        Ok(Self {
            secret,
            access_token_expiry_mins: parse_env("JWT_ACCESS_EXPIRY_MINS", "15")?,
        })
    }
}

pub fn generate_access_token(
    user_id: DbId,
    role: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let ttl = Duration::minutes(config.access_token_expiry_mins);
    sign(&Claims::for_user(user_id, role, ttl), config)
}

fn sign(claims: &Claims, config: &JwtConfig) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Check signature and expiry, returning the claims.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}
