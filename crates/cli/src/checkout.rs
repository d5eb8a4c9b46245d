//! Checkout trigger, the terminal twin of the pricing-page button.
//!
//! [`CheckoutButton`] follows the same rules as `static/js/checkout.js`:
//!
//! - activation enters a busy state and posts `{ priceId, quantity }`
//! - a success response with `url` navigates there and stays busy
//! - every failure raises an alert and leaves the busy state
//!
//! The HTTP call and the presentation sit behind [`CheckoutTransport`] and
//! [`Surface`], so the state machine is tested without a server.

use async_trait::async_trait;
use beacon_core::{PriceId, Quantity};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

/// Label shown while a checkout request is in flight.
pub const BUSY_LABEL: &str = "Redirecting…";

/// Errors raised before a response is available.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed.
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The checkout endpoint URL could not be built.
    #[error("Invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// JSON body sent to `POST /api/checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutBody {
    pub price_id: String,
    pub quantity: u32,
}

/// Status and parsed body of the checkout endpoint's response.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    /// `None` when the body is not JSON.
    pub body: Option<serde_json::Value>,
}

impl TransportResponse {
    const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    fn field(&self, name: &str) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|body| body.get(name))
            .and_then(serde_json::Value::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Error text for a non-success response: `message`, then `error`, then
    /// `Error <status>`.
    #[must_use]
    pub fn error_message(&self) -> String {
        self.field("message")
            .or_else(|| self.field("error"))
            .map_or_else(|| format!("Error {}", self.status), String::from)
    }
}

/// Performs the checkout POST.
#[async_trait]
pub trait CheckoutTransport: Send + Sync {
    /// Post `body` to the checkout endpoint.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` when no response is received.
    async fn post_checkout(&self, body: &CheckoutBody)
    -> Result<TransportResponse, TransportError>;
}

/// Where navigation and alerts go.
pub trait Surface {
    /// Leave the page for `url`.
    fn navigate(&mut self, url: &str);

    /// Show a blocking error message.
    fn alert(&mut self, message: &str);
}

/// The plan a button is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutOffer {
    pub price_id: PriceId,
    pub product_name: String,
    /// Display price, e.g. `$19/mo`.
    pub price: String,
    /// Always one for pricing-page buttons.
    pub quantity: Quantity,
}

/// What an activation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// The button was already busy; nothing was sent.
    Ignored,
    /// Navigated to the hosted checkout page.
    Redirected(String),
    /// An alert was raised with this message.
    Failed(String),
}

/// Checkout button state machine.
pub struct CheckoutButton<T, S> {
    offer: CheckoutOffer,
    transport: T,
    surface: S,
    busy: bool,
}

impl<T: CheckoutTransport, S: Surface> CheckoutButton<T, S> {
    /// Bind a button to an offer.
    pub const fn new(offer: CheckoutOffer, transport: T, surface: S) -> Self {
        Self {
            offer,
            transport,
            surface,
            busy: false,
        }
    }

    /// Whether activation is currently disabled.
    pub const fn is_busy(&self) -> bool {
        self.busy
    }

    /// Current button label.
    pub fn label(&self) -> String {
        if self.busy {
            BUSY_LABEL.to_string()
        } else {
            format!("Get {} for {}", self.offer.product_name, self.offer.price)
        }
    }

    /// The surface, for inspecting what was shown.
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// Activate the button.
    ///
    /// Only the redirect path leaves the button busy.
    #[instrument(skip(self), fields(price_id = %self.offer.price_id))]
    pub async fn activate(&mut self) -> Activation {
        if self.busy {
            return Activation::Ignored;
        }
        self.busy = true;

        let body = CheckoutBody {
            price_id: self.offer.price_id.to_string(),
            quantity: self.offer.quantity.get(),
        };

        match self.request(&body).await {
            Ok(url) => {
                debug!(%url, "Redirecting to checkout");
                self.surface.navigate(&url);
                Activation::Redirected(url)
            }
            Err(message) => {
                self.surface.alert(&message);
                self.busy = false;
                Activation::Failed(message)
            }
        }
    }

    /// Send the request and pick out the redirect URL or an error message.
    async fn request(&self, body: &CheckoutBody) -> Result<String, String> {
        let response = self
            .transport
            .post_checkout(body)
            .await
            .map_err(|e| e.to_string())?;

        if !response.is_success() {
            return Err(response.error_message());
        }

        response
            .field("url")
            .map(String::from)
            .ok_or_else(|| "missing payment URL".to_string())
    }
}

// =============================================================================
// reqwest transport
// =============================================================================

/// [`CheckoutTransport`] that posts to a running Beacon server.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
    origin: String,
    cookie: Option<String>,
}

impl HttpTransport {
    /// Create a transport for the server at `base_url`.
    ///
    /// `cookie` is sent verbatim as the `Cookie` header, carrying the
    /// Supabase session the way a browser would.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::InvalidUrl` if the endpoint URL cannot be
    /// built from `base_url`.
    pub fn new(base_url: &Url, cookie: Option<String>) -> Result<Self, TransportError> {
        let endpoint = base_url.join("/api/checkout")?;
        let origin = base_url.origin().ascii_serialization();

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            origin,
            cookie,
        })
    }
}

#[async_trait]
impl CheckoutTransport for HttpTransport {
    async fn post_checkout(
        &self,
        body: &CheckoutBody,
    ) -> Result<TransportResponse, TransportError> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::ORIGIN, &self.origin)
            .json(body);
        if let Some(cookie) = &self.cookie {
            request = request.header(reqwest::header::COOKIE, cookie);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        Ok(TransportResponse {
            status,
            body: serde_json::from_str(&text).ok(),
        })
    }
}

// =============================================================================
// Terminal surface
// =============================================================================

/// [`Surface`] for a terminal: the URL goes to stdout, alerts to stderr.
#[derive(Debug, Default)]
pub struct TerminalSurface {
    open_browser: bool,
    alerted: bool,
}

impl TerminalSurface {
    /// Create a surface; with `open_browser` the URL is also opened with the
    /// platform's URL handler.
    #[must_use]
    pub const fn new(open_browser: bool) -> Self {
        Self {
            open_browser,
            alerted: false,
        }
    }

    /// Whether an alert was shown.
    #[must_use]
    pub const fn alerted(&self) -> bool {
        self.alerted
    }
}

impl Surface for TerminalSurface {
    #[allow(clippy::print_stdout)]
    fn navigate(&mut self, url: &str) {
        println!("{url}");

        if !self.open_browser {
            return;
        }
        if let Err(e) = open_in_browser(url) {
            tracing::warn!(error = %e, "Could not open a browser");
        }
    }

    #[allow(clippy::print_stderr)]
    fn alert(&mut self, message: &str) {
        self.alerted = true;
        eprintln!("error: {message}");
    }
}

/// Platform program that opens a URL passed as its only argument.
///
/// The URL is never routed through `cmd`, where `&` in a query string
/// would split the command line.
const fn url_opener() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    }
}

/// Hand `url` to the platform's default URL handler.
fn open_in_browser(url: &str) -> std::io::Result<()> {
    std::process::Command::new(url_opener())
        .arg(url)
        .spawn()
        .map(drop)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    /// Transport returning a canned result and recording requests.
    struct FakeTransport {
        response: Mutex<Option<Result<TransportResponse, TransportError>>>,
        requests: Mutex<Vec<CheckoutBody>>,
    }

    impl FakeTransport {
        fn responding(status: u16, body: Option<serde_json::Value>) -> Self {
            Self {
                response: Mutex::new(Some(Ok(TransportResponse { status, body }))),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                response: Mutex::new(Some(Err(TransportError::InvalidUrl(
                    url::ParseError::EmptyHost,
                )))),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CheckoutTransport for FakeTransport {
        async fn post_checkout(
            &self,
            body: &CheckoutBody,
        ) -> Result<TransportResponse, TransportError> {
            self.requests.lock().unwrap().push(body.clone());
            self.response.lock().unwrap().take().unwrap()
        }
    }

    #[derive(Default)]
    struct RecordingSurface {
        navigations: Vec<String>,
        alerts: Vec<String>,
    }

    impl Surface for RecordingSurface {
        fn navigate(&mut self, url: &str) {
            self.navigations.push(url.to_string());
        }

        fn alert(&mut self, message: &str) {
            self.alerts.push(message.to_string());
        }
    }

    fn button(transport: FakeTransport) -> CheckoutButton<FakeTransport, RecordingSurface> {
        CheckoutButton::new(
            CheckoutOffer {
                price_id: PriceId::parse("price_123").unwrap(),
                product_name: "Pro".to_string(),
                price: "$49/mo".to_string(),
                quantity: Quantity::ONE,
            },
            transport,
            RecordingSurface::default(),
        )
    }

    #[tokio::test]
    async fn test_success_navigates_and_stays_busy() {
        let url = "https://checkout.stripe.com/c/pay/cs_test_1";
        let mut button = button(FakeTransport::responding(
            200,
            Some(json!({"id": "cs_test_1", "url": url})),
        ));

        assert_eq!(button.activate().await, Activation::Redirected(url.to_string()));
        assert!(button.is_busy());
        assert_eq!(button.label(), BUSY_LABEL);
        assert_eq!(button.surface().navigations, vec![url.to_string()]);
        assert!(button.surface().alerts.is_empty());

        let requests = button.transport.requests.lock().unwrap();
        assert_eq!(
            requests[0],
            CheckoutBody {
                price_id: "price_123".to_string(),
                quantity: 1
            }
        );
    }

    #[tokio::test]
    async fn test_busy_button_ignores_activation() {
        let mut button = button(FakeTransport::responding(
            200,
            Some(json!({"url": "https://checkout.stripe.com/x"})),
        ));
        button.activate().await;

        assert_eq!(button.activate().await, Activation::Ignored);
        assert_eq!(button.transport.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_success_without_url_alerts() {
        let mut button = button(FakeTransport::responding(200, Some(json!({"id": "cs_1"}))));

        assert_eq!(
            button.activate().await,
            Activation::Failed("missing payment URL".to_string())
        );
        assert!(!button.is_busy());
        assert_eq!(button.label(), "Get Pro for $49/mo");
        assert!(button.surface().navigations.is_empty());
    }

    #[tokio::test]
    async fn test_error_prefers_message_then_error_then_status() {
        let cases = [
            (Some(json!({"message": "m", "error": "e"})), "m"),
            (Some(json!({"error": "Unauthorized"})), "Unauthorized"),
            (Some(json!({})), "Error 401"),
            (None, "Error 401"),
        ];

        for (body, expected) in cases {
            let mut button = button(FakeTransport::responding(401, body));
            assert_eq!(button.activate().await, Activation::Failed(expected.to_string()));
            assert!(!button.is_busy());
            assert_eq!(button.surface().alerts, vec![expected.to_string()]);
        }
    }

    #[tokio::test]
    async fn test_payment_error_surfaces_error_field() {
        let mut button = button(FakeTransport::responding(
            400,
            Some(json!({"error": "Payment processing error", "details": "No such price"})),
        ));

        assert_eq!(
            button.activate().await,
            Activation::Failed("Payment processing error".to_string())
        );
    }

    #[tokio::test]
    async fn test_transport_failure_alerts_and_resets() {
        let mut button = button(FakeTransport::failing());

        let outcome = button.activate().await;
        assert!(matches!(outcome, Activation::Failed(msg) if msg.starts_with("Invalid base URL")));
        assert!(!button.is_busy());
        assert_eq!(button.surface().alerts.len(), 1);
    }

    #[test]
    fn test_http_transport_endpoint_and_origin() {
        let base = Url::parse("http://localhost:3000/some/page").unwrap();
        let transport = HttpTransport::new(&base, None).unwrap();
        assert_eq!(transport.endpoint.as_str(), "http://localhost:3000/api/checkout");
        assert_eq!(transport.origin, "http://localhost:3000");
    }

    #[test]
    fn test_checkout_body_is_camel_case() {
        let body = CheckoutBody {
            price_id: "price_123".to_string(),
            quantity: 1,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"priceId": "price_123", "quantity": 1})
        );
    }

    #[test]
    fn test_terminal_surface_records_alert() {
        let mut surface = TerminalSurface::new(false);
        surface.navigate("https://checkout.stripe.com/c/pay/cs_test_1?a=1&b=2");
        assert!(!surface.alerted());

        surface.alert("Unauthorized");
        assert!(surface.alerted());
    }

    #[test]
    fn test_url_opener_never_goes_through_cmd() {
        let opener = url_opener();
        assert_ne!(opener, "cmd");
        if cfg!(target_os = "windows") {
            assert_eq!(opener, "explorer");
        }
    }
}
