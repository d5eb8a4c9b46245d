//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Error bodies are JSON: `{ "error": <message> }`, plus `"details"` for
//! payment provider failures.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::config::ConfigError;
use crate::services::checkout::CheckoutError;
use crate::stripe::StripeError;
use crate::supabase::AuthError;

/// Application-level error type for the site.
#[derive(Debug, Error)]
pub enum AppError {
    /// No signed-in user.
    #[error("Unauthorized")]
    Unauthorized,

    /// Bad request from client.
    #[error("{0}")]
    Validation(String),

    /// Payment provider rejected or failed the request.
    #[error("Payment error: {0}")]
    Payment(#[from] StripeError),

    /// Service is misconfigured.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Authentication provider failed (not a rejected session).
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::MissingFields => Self::Validation(err.to_string()),
            CheckoutError::Config(err) => Self::Configuration(err),
            CheckoutError::Payment(err) => Self::Payment(err),
        }
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Validation(_) | Self::Payment(_) => StatusCode::BAD_REQUEST,
            Self::Configuration(_) | Self::Auth(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::Configuration(_) | Self::Auth(_) | Self::Internal(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Unauthorized => json!({ "error": "Unauthorized" }),
            Self::Validation(message) => json!({ "error": message }),
            Self::Payment(err) => {
                tracing::warn!(
                    error_type = err.error_type(),
                    code = err.code().unwrap_or_default(),
                    message = %err.details(),
                    "Payment provider error"
                );
                json!({ "error": "Payment processing error", "details": err.details() })
            }
            Self::Configuration(_) => json!({ "error": "Service configuration error" }),
            Self::Auth(_) | Self::Internal(_) => json!({ "error": "Internal server error" }),
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Checkout requested", Some(&[("price_id", "price_123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
