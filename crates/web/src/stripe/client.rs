//! [`PaymentProvider`] backed by the `async-stripe` SDK.

use std::sync::Arc;

use async_trait::async_trait;
use beacon_core::CheckoutSession;
use secrecy::ExposeSecret;
use tracing::{debug, instrument};

use super::types::CheckoutSessionParams;
use super::{PaymentProvider, StripeError};
use crate::config::StripeConfig;

// =============================================================================
// StripeClient
// =============================================================================

/// Client for the Stripe API.
#[derive(Clone)]
pub struct StripeClient {
    inner: Arc<StripeClientInner>,
}

struct StripeClientInner {
    client: ::stripe::Client,
    api_base: String,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("api_base", &self.inner.api_base)
            .field("secret_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl StripeClient {
    /// Create a new Stripe client.
    #[must_use]
    pub fn new(config: &StripeConfig) -> Self {
        let client = ::stripe::Client::from_url(
            config.api_base.as_str(),
            config.secret_key.expose_secret(),
        );

        Self {
            inner: Arc::new(StripeClientInner {
                client,
                api_base: config.api_base.clone(),
            }),
        }
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    #[instrument(skip(self, params), fields(user_id = %params.client_reference_id))]
    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> Result<CheckoutSession, StripeError> {
        let create = params.to_create_params()?;

        let session = ::stripe::CheckoutSession::create(&self.inner.client, create).await?;

        let url = session.url.ok_or_else(|| {
            StripeError::InvalidResponse("checkout session has no url".to_string())
        })?;

        debug!(session_id = %session.id, "Created checkout session");

        Ok(CheckoutSession {
            id: session.id.to_string(),
            url,
        })
    }
}

// =============================================================================
// SDK error mapping
// =============================================================================

impl From<::stripe::StripeError> for StripeError {
    fn from(err: ::stripe::StripeError) -> Self {
        match err {
            ::stripe::StripeError::Stripe(request) => {
                let status = request.http_status;
                Self::Api {
                    status,
                    error_type: error_type_name(&format!("{:?}", request.error_type)),
                    code: request.code.map(|code| snake_case(&format!("{code:?}"))),
                    message: request
                        .message
                        .unwrap_or_else(|| format!("Stripe returned status {status}")),
                }
            }
            ::stripe::StripeError::ClientError(message) => Self::Connection(message),
            ::stripe::StripeError::Timeout => Self::Connection("request timed out".to_string()),
            other => Self::InvalidResponse(other.to_string()),
        }
    }
}

/// Wire name of an SDK error type variant, e.g. `InvalidRequest` to
/// `invalid_request_error`.
fn error_type_name(variant: &str) -> String {
    match snake_case(variant).as_str() {
        "connection" => "api_connection_error".to_string(),
        name if name.ends_with("error") => name.to_string(),
        name => format!("{name}_error"),
    }
}

/// `ResourceMissing` to `resource_missing`.
fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (index, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if index > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
