//! Authentication extractor.
//!
//! Resolves the Supabase user behind the request cookies for handlers that
//! need one.

use axum::{extract::FromRequestParts, http::request::Parts};
use beacon_core::UserIdentity;
use tracing::debug;

use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;
use crate::supabase::RequestCookies;

/// Extractor that requires a signed-in user.
///
/// Rejects with [`AppError::Unauthorized`] when the cookies carry no valid
/// session, and with [`AppError::Auth`] when the identity provider fails.
/// Place it before body extractors so unauthenticated requests are rejected
/// whatever they send.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireUser(user): RequireUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireUser(pub UserIdentity);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookies = RequestCookies::from_headers(&parts.headers);

        let Some(user) = state.identity().current_user(&cookies).await? else {
            debug!(path = %parts.uri.path(), "Rejecting request without a signed-in user");
            return Err(AppError::Unauthorized);
        };

        set_sentry_user(&user.id, user.email.as_ref().map(beacon_core::Email::as_str));

        Ok(Self(user))
    }
}
