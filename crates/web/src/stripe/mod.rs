//! Stripe client for hosted Checkout Sessions.
//!
//! # Architecture
//!
//! - `async-stripe` SDK for the request encoding and the error envelope
//! - Only the one call the site needs: `POST /v1/checkout/sessions`
//! - No retries and no idempotency keys; a failed call surfaces to the user
//!
//! The [`PaymentProvider`] trait is the seam the checkout service depends on.
//!
//! # Example
//!
//! ```rust,ignore
//! use beacon_web::stripe::{CheckoutSessionParams, PaymentProvider, StripeClient};
//!
//! let client = StripeClient::new(&config.stripe);
//! let session = client.create_checkout_session(&params).await?;
//! println!("redirect to {}", session.url);
//! ```

mod client;
pub mod types;

pub use client::StripeClient;
pub use types::{
    CheckoutLineItem, CheckoutMode, CheckoutSessionParams, LineItemQuantity,
    SESSION_ID_PLACEHOLDER,
};

use async_trait::async_trait;
use beacon_core::CheckoutSession;
use thiserror::Error;

/// Message Stripe's own SDKs use for transport failures.
const CONNECTION_ERROR_MESSAGE: &str =
    "An error occurred with our connection to Stripe. Request was retried 0 times.";

/// Errors that can occur when interacting with the Stripe API.
///
/// Every variant is a payment-provider error: the checkout handler reports
/// all of them as a payment processing failure with [`StripeError::details`].
#[derive(Debug, Error)]
pub enum StripeError {
    /// Stripe answered with an error object.
    #[error("Stripe {error_type} error ({status}): {message}")]
    Api {
        /// HTTP status of the response.
        status: u16,
        /// Stripe error type (e.g., `invalid_request_error`, `card_error`).
        error_type: String,
        /// Stripe error code (e.g., `resource_missing`), when present.
        code: Option<String>,
        /// Human-readable message from Stripe.
        message: String,
    },

    /// A parameter the SDK's typed request cannot carry, rejected the way
    /// Stripe rejects it.
    #[error("Stripe invalid_request_error ({param}): {message}")]
    InvalidParam {
        /// Parameter in Stripe's bracket notation.
        param: String,
        message: String,
    },

    /// HTTP request failed before Stripe answered.
    #[error("Stripe connection error: {0}")]
    Connection(String),

    /// Stripe answered with something we could not use.
    #[error("Unexpected Stripe response: {0}")]
    InvalidResponse(String),
}

impl StripeError {
    /// Stripe error type, or a synthetic one for local failures.
    #[must_use]
    pub fn error_type(&self) -> &str {
        match self {
            Self::Api { error_type, .. } => error_type,
            Self::InvalidParam { .. } => "invalid_request_error",
            Self::Connection(_) => "api_connection_error",
            Self::InvalidResponse(_) => "api_error",
        }
    }

    /// Stripe error code, when present.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            Self::InvalidParam { .. } => Some("parameter_invalid_integer"),
            _ => None,
        }
    }

    /// Message safe to return to the browser.
    #[must_use]
    pub fn details(&self) -> String {
        match self {
            Self::Api { message, .. }
            | Self::InvalidParam { message, .. }
            | Self::InvalidResponse(message) => message.clone(),
            Self::Connection(_) => CONNECTION_ERROR_MESSAGE.to_string(),
        }
    }
}

/// Creates hosted checkout sessions.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a checkout session and return its ID and hosted URL.
    ///
    /// # Errors
    ///
    /// Returns `StripeError` if the provider rejects the request or cannot be
    /// reached.
    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> Result<CheckoutSession, StripeError>;
}
