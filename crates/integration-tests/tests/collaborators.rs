//! Wire-format tests for the Supabase and Stripe clients.
//!
//! Each test starts a small axum server standing in for the real API and
//! points the client at it.

#![recursion_limit = "256"]
#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Form, Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use beacon_core::{Email, PriceId, Quantity, UserId};
use beacon_integration_tests::{TEST_STRIPE_KEY, spawn, test_config_with};
use beacon_web::stripe::{
    CheckoutLineItem, CheckoutMode, CheckoutSessionParams, LineItemQuantity, PaymentProvider,
    StripeClient, StripeError,
};
use beacon_web::supabase::{AuthError, IdentityProvider, RequestCookies, SupabaseAuthClient};
use serde_json::json;

// ============================================================================
// Fake Supabase
// ============================================================================

async fn supabase_user(headers: HeaderMap) -> impl IntoResponse {
    if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some("test-anon-key") {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "No API key found" })));
    }

    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default();

    match token {
        "jwt-good" => (
            StatusCode::OK,
            Json(json!({ "id": "u1", "email": "a@b.com", "aud": "authenticated" })),
        ),
        "jwt-phone" => (StatusCode::OK, Json(json!({ "id": "u2", "email": "" }))),
        "jwt-boom" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "msg": "database unavailable" })),
        ),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "invalid JWT" }))),
    }
}

async fn supabase_client() -> SupabaseAuthClient {
    let addr = spawn(Router::new().route("/auth/v1/user", get(supabase_user))).await;
    let config = test_config_with(
        None,
        "https://api.stripe.com",
        &format!("http://127.0.0.1:{}", addr.port()),
    );
    SupabaseAuthClient::new(&config.supabase).unwrap()
}

fn session_cookie(access_token: &str) -> RequestCookies {
    let session = json!({ "access_token": access_token, "refresh_token": "r1" }).to_string();
    let value = format!("base64-{}", URL_SAFE_NO_PAD.encode(session));
    RequestCookies::from([("sb-127-auth-token", value.as_str())])
}

#[tokio::test]
async fn test_supabase_resolves_user() {
    let client = supabase_client().await;

    let user = client
        .current_user(&session_cookie("jwt-good"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(user.id.as_str(), "u1");
    assert_eq!(user.email.unwrap().as_str(), "a@b.com");
}

#[tokio::test]
async fn test_supabase_user_with_empty_email() {
    let client = supabase_client().await;

    let user = client
        .current_user(&session_cookie("jwt-phone"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(user.id.as_str(), "u2");
    assert!(user.email.is_none());
}

#[tokio::test]
async fn test_supabase_rejected_token_is_anonymous() {
    let client = supabase_client().await;

    let user = client
        .current_user(&session_cookie("jwt-expired"))
        .await
        .unwrap();

    assert!(user.is_none());
}

#[tokio::test]
async fn test_supabase_server_error_is_error() {
    let client = supabase_client().await;

    let result = client.current_user(&session_cookie("jwt-boom")).await;

    assert!(matches!(result, Err(AuthError::Api { status: 500, .. })));
}

#[tokio::test]
async fn test_supabase_cookie_for_other_project_is_ignored() {
    let client = supabase_client().await;
    let session = json!({ "access_token": "jwt-good" }).to_string();
    let value = format!("base64-{}", URL_SAFE_NO_PAD.encode(session));
    let cookies = RequestCookies::from([("sb-other-auth-token", value.as_str())]);

    let user = client.current_user(&cookies).await.unwrap();

    assert!(user.is_none());
}

// ============================================================================
// Fake Stripe
// ============================================================================

#[derive(Clone, Default)]
struct StripeRecorder {
    requests: Arc<Mutex<Vec<(HeaderMap, HashMap<String, String>)>>>,
}

/// A `checkout.session` object as the Checkout Sessions API returns it.
fn checkout_session_body(id: &str, url: Option<&str>) -> serde_json::Value {
    json!({
        "id": id,
        "object": "checkout.session",
        "after_expiration": null,
        "allow_promotion_codes": null,
        "amount_subtotal": 4900,
        "amount_total": 4900,
        "automatic_tax": { "enabled": false, "liability": null, "status": null },
        "billing_address_collection": null,
        "cancel_url": "https://beacon.dev/pricing?checkout=cancelled",
        "client_reference_id": "u1",
        "client_secret": null,
        "consent": null,
        "consent_collection": null,
        "created": 1_760_000_000,
        "currency": "usd",
        "custom_fields": [],
        "custom_text": {
            "after_submit": null,
            "shipping_address": null,
            "submit": null,
            "terms_of_service_acceptance": null
        },
        "customer": null,
        "customer_creation": null,
        "customer_details": null,
        "customer_email": "a@b.com",
        "expires_at": 1_760_086_400,
        "invoice": null,
        "invoice_creation": null,
        "livemode": false,
        "locale": null,
        "metadata": {},
        "mode": "subscription",
        "payment_intent": null,
        "payment_link": null,
        "payment_method_collection": "always",
        "payment_method_options": null,
        "payment_method_types": ["card"],
        "payment_status": "unpaid",
        "phone_number_collection": { "enabled": false },
        "recovered_from": null,
        "setup_intent": null,
        "shipping_address_collection": null,
        "shipping_cost": null,
        "shipping_details": null,
        "shipping_options": [],
        "status": "open",
        "submit_type": null,
        "subscription": null,
        "success_url": "https://beacon.dev/checkout/success?session_id={CHECKOUT_SESSION_ID}",
        "total_details": null,
        "ui_mode": "hosted",
        "url": url
    })
}

async fn stripe_sessions(
    State(recorder): State<StripeRecorder>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    let price = form.get("line_items[0][price]").cloned().unwrap_or_default();
    recorder.requests.lock().unwrap().push((headers, form));

    match price.as_str() {
        "price_missing" => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": {
                    "type": "invalid_request_error",
                    "code": "resource_missing",
                    "param": "line_items[0][price]",
                    "message": "No such price: 'price_missing'"
                }
            })),
        ),
        "price_embedded" => (
            StatusCode::OK,
            Json(checkout_session_body("cs_test_embedded", None)),
        ),
        _ => (
            StatusCode::OK,
            Json(checkout_session_body(
                "cs_test_a1b2c3",
                Some("https://checkout.stripe.com/c/pay/cs_test_a1b2c3"),
            )),
        ),
    }
}

async fn stripe_client() -> (StripeClient, StripeRecorder) {
    let recorder = StripeRecorder::default();
    let router = Router::new()
        .route("/v1/checkout/sessions", post(stripe_sessions))
        .with_state(recorder.clone());
    let addr = spawn(router).await;

    let config = test_config_with(None, &format!("http://{addr}"), "https://test.supabase.co");
    (StripeClient::new(&config.stripe), recorder)
}

fn params(price: &str) -> CheckoutSessionParams {
    params_with_quantity(price, LineItemQuantity::from(Quantity::ONE))
}

fn params_with_quantity(price: &str, quantity: LineItemQuantity) -> CheckoutSessionParams {
    CheckoutSessionParams {
        line_items: vec![CheckoutLineItem {
            price: PriceId::parse(price).unwrap(),
            quantity,
        }],
        mode: CheckoutMode::Subscription,
        success_url: "https://beacon.dev/checkout/success?session_id={CHECKOUT_SESSION_ID}"
            .to_string(),
        cancel_url: "https://beacon.dev/pricing?checkout=cancelled".to_string(),
        client_reference_id: UserId::parse("u1").unwrap(),
        customer_email: Some(Email::parse("a@b.com").unwrap()),
    }
}

#[tokio::test]
async fn test_stripe_creates_session() {
    let (client, recorder) = stripe_client().await;

    let session = client
        .create_checkout_session(&params("price_123"))
        .await
        .unwrap();

    assert_eq!(session.id, "cs_test_a1b2c3");
    assert_eq!(session.url, "https://checkout.stripe.com/c/pay/cs_test_a1b2c3");

    let requests = recorder.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (headers, form) = &requests[0];
    assert_eq!(
        headers.get(header::AUTHORIZATION).unwrap(),
        &format!("Bearer {TEST_STRIPE_KEY}")
    );
    assert!(headers.contains_key("stripe-version"));
    assert_eq!(form["mode"], "subscription");
    assert_eq!(form["line_items[0][price]"], "price_123");
    assert_eq!(form["line_items[0][quantity]"], "1");
    assert_eq!(form["client_reference_id"], "u1");
    assert_eq!(form["customer_email"], "a@b.com");
    assert_eq!(
        form["success_url"],
        "https://beacon.dev/checkout/success?session_id={CHECKOUT_SESSION_ID}"
    );
    assert_eq!(form["cancel_url"], "https://beacon.dev/pricing?checkout=cancelled");
}

#[tokio::test]
async fn test_stripe_error_envelope_is_parsed() {
    let (client, _recorder) = stripe_client().await;

    let err = client
        .create_checkout_session(&params("price_missing"))
        .await
        .unwrap_err();

    assert!(matches!(err, StripeError::Api { status: 400, .. }));
    assert_eq!(err.error_type(), "invalid_request_error");
    assert_eq!(err.code(), Some("resource_missing"));
    assert_eq!(err.details(), "No such price: 'price_missing'");
}

#[tokio::test]
async fn test_stripe_rejects_negative_quantity_before_sending() {
    let (client, recorder) = stripe_client().await;

    let err = client
        .create_checkout_session(&params_with_quantity(
            "price_123",
            LineItemQuantity::from_form_text("-1"),
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, StripeError::InvalidParam { .. }));
    assert_eq!(err.details(), "This value must be greater than or equal to 1.");
    assert!(recorder.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_stripe_sends_numeric_string_quantity() {
    let (client, recorder) = stripe_client().await;

    client
        .create_checkout_session(&params_with_quantity(
            "price_123",
            LineItemQuantity::from_form_text("3"),
        ))
        .await
        .unwrap();

    let requests = recorder.requests.lock().unwrap();
    assert_eq!(requests[0].1["line_items[0][quantity]"], "3");
}

#[tokio::test]
async fn test_stripe_session_without_url_is_invalid() {
    let (client, _recorder) = stripe_client().await;

    let err = client
        .create_checkout_session(&params("price_embedded"))
        .await
        .unwrap_err();

    assert!(matches!(err, StripeError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_stripe_unreachable_is_connection_error() {
    // Bind then drop a listener so the port is closed.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = test_config_with(None, &format!("http://{addr}"), "https://test.supabase.co");
    let client = StripeClient::new(&config.stripe);

    let err = client
        .create_checkout_session(&params("price_123"))
        .await
        .unwrap_err();

    assert!(matches!(err, StripeError::Connection(_)));
    assert_eq!(err.error_type(), "api_connection_error");
}
