//! Checkout return page.
//!
//! Stripe redirects here with `session_id` after a completed payment. The
//! page only confirms; subscription state is owned by the payment provider.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::{info, instrument};

use super::meta::PageMeta;
use crate::filters;
use crate::middleware::CspNonce;
use crate::state::AppState;

/// Longest session ID we echo back.
const MAX_SESSION_ID_LEN: usize = 255;

/// Query parameters Stripe appends to the success URL.
#[derive(Debug, Default, Deserialize)]
pub struct SuccessQuery {
    pub session_id: Option<String>,
}

/// Checkout success template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct CheckoutSuccessTemplate {
    pub meta: PageMeta,
    pub nonce: String,
    /// Session reference shown to the customer for support requests.
    pub session_id: Option<String>,
}

/// Keep only IDs shaped like Stripe session IDs.
fn sanitize_session_id(raw: Option<String>) -> Option<String> {
    raw.filter(|id| {
        id.starts_with("cs_")
            && id.len() <= MAX_SESSION_ID_LEN
            && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
    })
}

/// Display the checkout success page.
#[instrument(skip(state, nonce, query))]
pub async fn success(
    State(state): State<AppState>,
    nonce: CspNonce,
    Query(query): Query<SuccessQuery>,
) -> CheckoutSuccessTemplate {
    let session_id = sanitize_session_id(query.session_id);
    if let Some(id) = &session_id {
        info!(session_id = %id, "Checkout completed");
    }

    CheckoutSuccessTemplate {
        meta: PageMeta::new("Welcome aboard", "Your Beacon subscription is active.")
            .with_canonical(state.config().site_url.as_deref(), "/checkout/success")
            .noindex(),
        nonce: nonce.0,
        session_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_session_id() {
        assert_eq!(
            sanitize_session_id(Some("cs_test_a1B2c3".to_string())).as_deref(),
            Some("cs_test_a1B2c3")
        );
        assert!(sanitize_session_id(Some("{CHECKOUT_SESSION_ID}".to_string())).is_none());
        assert!(sanitize_session_id(Some("cs_<script>".to_string())).is_none());
        assert!(sanitize_session_id(None).is_none());
    }
}
