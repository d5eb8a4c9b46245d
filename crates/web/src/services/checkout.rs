//! Checkout session creation.
//!
//! Validates the body posted by a checkout button, builds the return URLs
//! and asks the payment provider for a subscription-mode session on behalf
//! of the signed-in user.

use beacon_core::{CheckoutSession, PriceId, UserIdentity};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument};

use crate::config::{ConfigError, parse_base_url};
use crate::stripe::{
    CheckoutLineItem, CheckoutMode, CheckoutSessionParams, LineItemQuantity, PaymentProvider,
    SESSION_ID_PLACEHOLDER, StripeError,
};

/// Errors from the checkout flow, before they become HTTP responses.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// `priceId` or `quantity` is absent or falsy.
    #[error("Missing priceId or quantity")]
    MissingFields,

    /// Return URLs could not be built.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The payment provider failed.
    #[error(transparent)]
    Payment(#[from] StripeError),
}

/// JSON body posted to `/api/checkout`.
///
/// Fields are kept as raw JSON values. Only falsy values (absent, `null`,
/// `false`, `0`, `""`) count as missing; anything else is forwarded to the
/// payment provider as its form text, which decides whether it is usable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub price_id: Option<serde_json::Value>,
    #[serde(default)]
    pub quantity: Option<serde_json::Value>,
}

/// A checkout request with both fields present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCheckout {
    pub price_id: PriceId,
    pub quantity: LineItemQuantity,
}

impl CheckoutRequest {
    /// Check that both required fields are present.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::MissingFields` when either field is absent or
    /// falsy.
    pub fn validate(&self) -> Result<ValidatedCheckout, CheckoutError> {
        let price_id = self
            .price_id
            .as_ref()
            .and_then(form_text)
            .and_then(|text| PriceId::parse(&text).ok())
            .ok_or(CheckoutError::MissingFields)?;

        let quantity = self
            .quantity
            .as_ref()
            .and_then(form_text)
            .map(LineItemQuantity::from_form_text)
            .ok_or(CheckoutError::MissingFields)?;

        Ok(ValidatedCheckout { price_id, quantity })
    }
}

/// Text a JSON value is sent as, or `None` when the value is falsy.
fn form_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null | serde_json::Value::Bool(false) => None,
        serde_json::Value::Bool(true) => Some("true".to_string()),
        serde_json::Value::String(text) if text.is_empty() => None,
        serde_json::Value::String(text) => Some(text.clone()),
        serde_json::Value::Number(number) => {
            if let Some(whole) = number.as_i64() {
                (whole != 0).then(|| whole.to_string())
            } else if let Some(whole) = number.as_u64() {
                Some(whole.to_string())
            } else {
                let float = number.as_f64()?;
                (float != 0.0).then(|| float.to_string())
            }
        }
        other => Some(other.to_string()),
    }
}

/// Where Stripe sends the browser after checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnUrls {
    pub success_url: String,
    pub cancel_url: String,
}

impl ReturnUrls {
    /// Build return URLs under a site base URL (no trailing slash).
    #[must_use]
    pub fn for_base(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        Self {
            success_url: format!("{base_url}/checkout/success?session_id={SESSION_ID_PLACEHOLDER}"),
            cancel_url: format!("{base_url}/pricing?checkout=cancelled"),
        }
    }

    /// Resolve the base URL from `SITE_URL`, falling back to the request
    /// `Origin` header.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar("SITE_URL")` when neither source
    /// yields an absolute http(s) URL.
    pub fn resolve(site_url: Option<&str>, origin: Option<&str>) -> Result<Self, ConfigError> {
        if let Some(site_url) = site_url {
            return Ok(Self::for_base(site_url));
        }

        // Sandboxed documents send `Origin: null`, which fails to parse
        origin
            .and_then(|origin| parse_base_url("Origin", origin).ok())
            .map(|base| Self::for_base(&base))
            .ok_or_else(|| ConfigError::MissingEnvVar("SITE_URL".to_string()))
    }
}

/// Build the provider parameters for one subscription line item.
#[must_use]
pub fn session_params(
    user: &UserIdentity,
    checkout: &ValidatedCheckout,
    urls: &ReturnUrls,
) -> CheckoutSessionParams {
    CheckoutSessionParams {
        line_items: vec![CheckoutLineItem {
            price: checkout.price_id.clone(),
            quantity: checkout.quantity.clone(),
        }],
        mode: CheckoutMode::Subscription,
        success_url: urls.success_url.clone(),
        cancel_url: urls.cancel_url.clone(),
        client_reference_id: user.id.clone(),
        customer_email: user.email.clone(),
    }
}

/// Create a checkout session for `user`.
///
/// # Errors
///
/// Returns `CheckoutError::Payment` if the provider fails.
#[instrument(skip(payments, urls), fields(user_id = %user.id, price_id = %checkout.price_id))]
pub async fn create_session(
    payments: &dyn PaymentProvider,
    user: &UserIdentity,
    checkout: &ValidatedCheckout,
    urls: &ReturnUrls,
) -> Result<CheckoutSession, CheckoutError> {
    let params = session_params(user, checkout, urls);
    let session = payments.create_checkout_session(&params).await?;

    info!(session_id = %session.id, quantity = %checkout.quantity, "Checkout session created");

    Ok(session)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use beacon_core::{Email, UserId};
    use serde_json::json;

    use super::*;

    fn request(body: serde_json::Value) -> CheckoutRequest {
        serde_json::from_value(body).unwrap()
    }

    fn user(email: Option<&str>) -> UserIdentity {
        UserIdentity::new(
            UserId::parse("u1").unwrap(),
            email.map(|e| Email::parse(e).unwrap()),
        )
    }

    #[derive(Default)]
    struct RecordingProvider {
        calls: Mutex<Vec<CheckoutSessionParams>>,
        fail: bool,
    }

    #[async_trait]
    impl PaymentProvider for RecordingProvider {
        async fn create_checkout_session(
            &self,
            params: &CheckoutSessionParams,
        ) -> Result<CheckoutSession, StripeError> {
            self.calls.lock().unwrap().push(params.clone());
            if self.fail {
                return Err(StripeError::Api {
                    status: 400,
                    error_type: "invalid_request_error".to_string(),
                    code: Some("resource_missing".to_string()),
                    message: "No such price".to_string(),
                });
            }
            Ok(CheckoutSession {
                id: "cs_test_1".to_string(),
                url: "https://checkout.stripe.com/c/pay/cs_test_1".to_string(),
            })
        }
    }

    #[test]
    fn test_validate_accepts_well_formed_body() {
        let checkout = request(json!({"priceId": "price_123", "quantity": 2}))
            .validate()
            .unwrap();
        assert_eq!(checkout.price_id.as_str(), "price_123");
        assert_eq!(checkout.quantity.as_str(), "2");
    }

    #[test]
    fn test_validate_accepts_integral_float() {
        let checkout = request(json!({"priceId": "price_123", "quantity": 1.0}))
            .validate()
            .unwrap();
        assert_eq!(checkout.quantity.as_str(), "1");
    }

    #[test]
    fn test_validate_rejects_missing_or_empty_price() {
        for body in [
            json!({"quantity": 1}),
            json!({"priceId": "", "quantity": 1}),
            json!({"priceId": null, "quantity": 1}),
            json!({"priceId": false, "quantity": 1}),
            json!({"priceId": 0, "quantity": 1}),
        ] {
            assert!(
                matches!(request(body.clone()).validate(), Err(CheckoutError::MissingFields)),
                "expected missing fields for {body}"
            );
        }
    }

    #[test]
    fn test_validate_rejects_falsy_quantity() {
        for body in [
            json!({"priceId": "price_123"}),
            json!({"priceId": "price_123", "quantity": null}),
            json!({"priceId": "price_123", "quantity": 0}),
            json!({"priceId": "price_123", "quantity": 0.0}),
            json!({"priceId": "price_123", "quantity": ""}),
            json!({"priceId": "price_123", "quantity": false}),
        ] {
            assert!(
                matches!(request(body.clone()).validate(), Err(CheckoutError::MissingFields)),
                "expected missing fields for {body}"
            );
        }
    }

    #[test]
    fn test_validate_forwards_truthy_values_verbatim() {
        let cases = [
            (json!({"priceId": "price_123", "quantity": -1}), "price_123", "-1"),
            (json!({"priceId": "price_123", "quantity": 1.5}), "price_123", "1.5"),
            (json!({"priceId": "price_123", "quantity": "1"}), "price_123", "1"),
            (json!({"priceId": "price_123", "quantity": true}), "price_123", "true"),
            (json!({"priceId": "   ", "quantity": 1}), "   ", "1"),
            (json!({"priceId": 42, "quantity": 1}), "42", "1"),
        ];
        for (body, price, quantity) in cases {
            let checkout = request(body.clone()).validate().unwrap();
            assert_eq!(checkout.price_id.as_str(), price, "price for {body}");
            assert_eq!(checkout.quantity.as_str(), quantity, "quantity for {body}");
        }
    }

    #[test]
    fn test_return_urls_for_base() {
        let urls = ReturnUrls::for_base("https://beacon.dev/");
        assert_eq!(
            urls.success_url,
            "https://beacon.dev/checkout/success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(urls.cancel_url, "https://beacon.dev/pricing?checkout=cancelled");
    }

    #[test]
    fn test_return_urls_prefer_site_url() {
        let urls =
            ReturnUrls::resolve(Some("https://beacon.dev"), Some("http://localhost:3000")).unwrap();
        assert!(urls.success_url.starts_with("https://beacon.dev/"));
    }

    #[test]
    fn test_return_urls_fall_back_to_origin() {
        let urls = ReturnUrls::resolve(None, Some("http://localhost:3000")).unwrap();
        assert_eq!(urls.cancel_url, "http://localhost:3000/pricing?checkout=cancelled");
    }

    #[test]
    fn test_return_urls_without_any_base_is_config_error() {
        assert!(matches!(
            ReturnUrls::resolve(None, None),
            Err(ConfigError::MissingEnvVar(var)) if var == "SITE_URL"
        ));
        assert!(matches!(
            ReturnUrls::resolve(None, Some("null")),
            Err(ConfigError::MissingEnvVar(_))
        ));
    }

    #[test]
    fn test_session_params_shape() {
        let checkout = request(json!({"priceId": "price_123", "quantity": 1}))
            .validate()
            .unwrap();
        let params = session_params(
            &user(Some("a@b.com")),
            &checkout,
            &ReturnUrls::for_base("https://beacon.dev"),
        );

        assert_eq!(params.mode, CheckoutMode::Subscription);
        assert_eq!(params.line_items.len(), 1);
        assert_eq!(params.line_items[0].price.as_str(), "price_123");
        assert_eq!(params.line_items[0].quantity.as_str(), "1");
        assert_eq!(params.client_reference_id.as_str(), "u1");
        assert_eq!(params.customer_email.unwrap().as_str(), "a@b.com");
        assert!(params.success_url.contains(SESSION_ID_PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_create_session_calls_provider_once() {
        let provider = RecordingProvider::default();
        let checkout = request(json!({"priceId": "price_123", "quantity": 1}))
            .validate()
            .unwrap();

        let session = create_session(
            &provider,
            &user(None),
            &checkout,
            &ReturnUrls::for_base("https://beacon.dev"),
        )
        .await
        .unwrap();

        assert_eq!(session.id, "cs_test_1");
        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].customer_email.is_none());
    }

    #[tokio::test]
    async fn test_create_session_propagates_provider_error() {
        let provider = RecordingProvider {
            fail: true,
            ..RecordingProvider::default()
        };
        let checkout = request(json!({"priceId": "price_123", "quantity": 1}))
            .validate()
            .unwrap();

        let err = create_session(
            &provider,
            &user(None),
            &checkout,
            &ReturnUrls::for_base("https://beacon.dev"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CheckoutError::Payment(_)));
    }
}
