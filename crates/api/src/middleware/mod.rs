//! Request interceptors.
//!
//! - [`auth::require_auth`] -- rejects requests without a valid bearer token
//!   before they reach a handler.
//! - [`auth::AuthUser`] -- the authenticated user, extractable by handlers
//!   behind `require_auth`.

pub mod auth;
