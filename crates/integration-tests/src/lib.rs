//! Integration test harness for Beacon.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p beacon-integration-tests
//! ```
//!
//! No external services are needed: the router is driven in-process with
//! in-memory collaborators, and wire-format tests spin up small axum
//! servers standing in for Supabase and Stripe on `127.0.0.1:0`.
//!
//! # Test Categories
//!
//! - `checkout_api` - `POST /api/checkout` status and body mapping
//! - `pages` - Marketing pages, static assets, security headers
//! - `collaborators` - Supabase and Stripe clients against fake servers
//! - `checkout_button` - CLI checkout trigger against a running app

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use beacon_core::{CheckoutSession, Email, UserId, UserIdentity};
use beacon_web::config::{SiteConfig, StripeConfig, SupabaseConfig};
use beacon_web::state::AppState;
use beacon_web::stripe::{CheckoutSessionParams, PaymentProvider, StripeError};
use beacon_web::supabase::{AuthError, IdentityProvider, RequestCookies};
use http_body_util::BodyExt;
use secrecy::SecretString;
use tower::ServiceExt;

/// Cookie the fake identity provider reads its session token from.
pub const SESSION_COOKIE: &str = "sb-test-auth-token";

/// Stripe key that passes config validation.
pub const TEST_STRIPE_KEY: &str = "sk_test_51NzQeKLm8vR2aT7bXp4WcYd9Hs3Jf6Ug";

/// Session the fake payment provider returns by default.
pub const TEST_SESSION_ID: &str = "cs_test_a1b2c3";
pub const TEST_SESSION_URL: &str = "https://checkout.stripe.com/c/pay/cs_test_a1b2c3";

// =============================================================================
// Configuration
// =============================================================================

/// Build a configuration without touching the environment.
#[must_use]
pub fn test_config(site_url: Option<&str>) -> SiteConfig {
    test_config_with(site_url, "https://api.stripe.com", "https://test.supabase.co")
}

/// Build a configuration pointing the collaborators at custom base URLs.
#[must_use]
pub fn test_config_with(site_url: Option<&str>, stripe_base: &str, supabase_url: &str) -> SiteConfig {
    SiteConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        site_url: site_url.map(String::from),
        supabase: SupabaseConfig {
            url: url::Url::parse(supabase_url).unwrap(),
            anon_key: SecretString::from("test-anon-key"),
        },
        stripe: StripeConfig {
            secret_key: SecretString::from(TEST_STRIPE_KEY),
            api_base: stripe_base.trim_end_matches('/').to_string(),
            starter_price_id: Some("price_starter".to_string()),
            pro_price_id: Some("price_pro".to_string()),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A signed-in user.
#[must_use]
pub fn user(id: &str, email: Option<&str>) -> UserIdentity {
    UserIdentity::new(
        UserId::parse(id).unwrap(),
        email.map(|e| Email::parse(e).unwrap()),
    )
}

// =============================================================================
// Fake collaborators
// =============================================================================

/// Identity provider mapping session tokens to users.
#[derive(Default)]
pub struct FakeIdentity {
    sessions: HashMap<String, UserIdentity>,
    fail: bool,
    lookups: Mutex<usize>,
}

impl FakeIdentity {
    /// Provider that knows one session token.
    #[must_use]
    pub fn with_session(token: &str, user: UserIdentity) -> Self {
        Self {
            sessions: HashMap::from([(token.to_string(), user)]),
            ..Self::default()
        }
    }

    /// Provider that is unreachable.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Number of lookups performed.
    #[must_use]
    pub fn lookups(&self) -> usize {
        *self.lookups.lock().unwrap()
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn current_user(
        &self,
        cookies: &RequestCookies,
    ) -> Result<Option<UserIdentity>, AuthError> {
        *self.lookups.lock().unwrap() += 1;
        if self.fail {
            return Err(AuthError::Api {
                status: 503,
                message: "auth service unavailable".to_string(),
            });
        }
        Ok(cookies
            .get(SESSION_COOKIE)
            .and_then(|token| self.sessions.get(token))
            .cloned())
    }
}

/// What the fake payment provider answers.
pub enum PaymentOutcome {
    Session(CheckoutSession),
    Decline {
        error_type: String,
        code: Option<String>,
        message: String,
    },
}

/// Payment provider recording every request.
///
/// Parameters go through the same request building as the real client, so
/// quantities Stripe would refuse come back as `StripeError::InvalidParam`.
pub struct FakePayments {
    outcome: PaymentOutcome,
    calls: Mutex<Vec<CheckoutSessionParams>>,
}

impl Default for FakePayments {
    fn default() -> Self {
        Self::returning(TEST_SESSION_ID, TEST_SESSION_URL)
    }
}

impl FakePayments {
    /// Provider that creates the given session.
    #[must_use]
    pub fn returning(id: &str, url: &str) -> Self {
        Self {
            outcome: PaymentOutcome::Session(CheckoutSession {
                id: id.to_string(),
                url: url.to_string(),
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Provider that rejects every request with a Stripe API error.
    #[must_use]
    pub fn declining(error_type: &str, code: Option<&str>, message: &str) -> Self {
        Self {
            outcome: PaymentOutcome::Decline {
                error_type: error_type.to_string(),
                code: code.map(String::from),
                message: message.to_string(),
            },
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<CheckoutSessionParams> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentProvider for FakePayments {
    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> Result<CheckoutSession, StripeError> {
        self.calls.lock().unwrap().push(params.clone());
        params.to_create_params()?;
        match &self.outcome {
            PaymentOutcome::Session(session) => Ok(session.clone()),
            PaymentOutcome::Decline {
                error_type,
                code,
                message,
            } => Err(StripeError::Api {
                status: 400,
                error_type: error_type.clone(),
                code: code.clone(),
                message: message.clone(),
            }),
        }
    }
}

// =============================================================================
// Test application
// =============================================================================

/// The assembled router plus handles on its collaborators.
pub struct TestApp {
    pub router: Router,
    pub identity: Arc<FakeIdentity>,
    pub payments: Arc<FakePayments>,
}

/// A response with its body read.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// Parse the body as JSON.
    #[must_use]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

impl TestApp {
    /// App with `u1 <a@b.com>` signed in under token `valid-token`.
    #[must_use]
    pub fn signed_in() -> Self {
        Self::new(
            test_config(Some("https://beacon.dev")),
            FakeIdentity::with_session("valid-token", user("u1", Some("a@b.com"))),
            FakePayments::default(),
        )
    }

    /// App with explicit configuration and collaborators.
    #[must_use]
    pub fn new(config: SiteConfig, identity: FakeIdentity, payments: FakePayments) -> Self {
        let identity = Arc::new(identity);
        let payments = Arc::new(payments);
        let state = AppState::new(config, identity.clone(), payments.clone());

        Self {
            router: beacon_web::app(state),
            identity,
            payments,
        }
    }

    /// Send a request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    /// `GET path`.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
    }

    /// `POST /api/checkout` with a raw body and an optional session token.
    pub async fn post_checkout(&self, token: Option<&str>, body: &str) -> TestResponse {
        let mut request = Request::builder()
            .method("POST")
            .uri("/api/checkout")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.header(header::COOKIE, format!("{SESSION_COOKIE}={token}"));
        }
        self.send(request.body(Body::from(body.to_string())).unwrap())
            .await
    }
}

/// Serve `router` on an ephemeral local port.
pub async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}
