//! JSON API routes.

pub mod checkout;

use axum::{Router, routing::post};

use crate::state::AppState;

/// Create the API routes router.
pub fn routes() -> Router<AppState> {
    Router::new().route("/checkout", post(checkout::create_checkout))
}
