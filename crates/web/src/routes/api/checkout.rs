//! Checkout API route.
//!
//! JSON endpoint the pricing-page buttons post to. Creates a Stripe Checkout
//! Session for the signed-in user and returns where to send the browser.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, header::ORIGIN},
};
use beacon_core::CheckoutSession;
use tracing::instrument;

use crate::error::{AppError, add_breadcrumb};
use crate::middleware::RequireUser;
use crate::services::checkout::{self, CheckoutRequest, ReturnUrls};
use crate::state::AppState;

/// Create a checkout session for the current user.
///
/// POST /api/checkout
///
/// Body: `{ "priceId": string, "quantity": number }`. Responds with
/// `{ "id", "url" }`.
///
/// `RequireUser` runs before the body is read, so unauthenticated requests
/// get 401 whatever they send. A body that is not JSON at all is an internal
/// error, not a validation error.
///
/// # Errors
///
/// - `AppError::Unauthorized` without a signed-in user
/// - `AppError::Validation` when `priceId` or `quantity` is missing
/// - `AppError::Configuration` when no return URL base is available
/// - `AppError::Payment` when Stripe fails
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_checkout(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CheckoutSession>, AppError> {
    let request: CheckoutRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::Internal(format!("unreadable checkout body: {e}")))?;

    let validated = request.validate()?;

    add_breadcrumb(
        "checkout",
        "Checkout requested",
        Some(&[("price_id", validated.price_id.as_str())]),
    );

    let origin = headers.get(ORIGIN).and_then(|value| value.to_str().ok());
    let urls = ReturnUrls::resolve(state.config().site_url.as_deref(), origin)?;

    let session = checkout::create_session(state.payments(), &user, &validated, &urls).await?;

    Ok(Json(session))
}
