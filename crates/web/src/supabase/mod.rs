//! Supabase Auth client used for identity lookup.
//!
//! # Architecture
//!
//! - The browser holds a Supabase session cookie (`sb-<project-ref>-auth-token`)
//!   written by the Supabase JS client
//! - The server never trusts the cookie's contents: the access token inside is
//!   verified on every request with `GET /auth/v1/user`
//! - No sessions are stored locally
//!
//! The [`IdentityProvider`] trait is the seam the checkout handler depends on,
//! so tests can substitute an in-memory provider.

mod client;
mod cookie;
mod types;

pub use client::SupabaseAuthClient;
pub use cookie::{RequestCookies, decode_session_cookie, session_cookie_name};
pub use types::{SessionPayload, SupabaseUser};

use async_trait::async_trait;
use beacon_core::UserIdentity;
use thiserror::Error;

/// Errors that can occur while resolving an identity.
///
/// A missing or rejected session is not an error: it resolves to `None`.
#[derive(Debug, Error)]
pub enum AuthError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Supabase returned an unexpected status.
    #[error("Supabase API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The user payload could not be used.
    #[error("Invalid user payload: {0}")]
    InvalidUser(String),
}

/// Resolves the calling user from request cookies.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Return the current user, or `None` when the request carries no valid
    /// session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` when the provider cannot be reached or answers
    /// with something other than a user or a rejection.
    async fn current_user(
        &self,
        cookies: &RequestCookies,
    ) -> Result<Option<UserIdentity>, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        let err = AuthError::Api {
            status: 500,
            message: "upstream down".to_string(),
        };
        assert_eq!(err.to_string(), "Supabase API error: 500 - upstream down");
    }
}
