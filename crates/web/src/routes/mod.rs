//! HTTP route handlers for the site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /pricing                - Plans with checkout buttons
//! GET  /checkout/success       - Return page after a completed checkout
//! GET  /health                 - Health check (registered in `app`)
//!
//! # API
//! POST /api/checkout           - Create a checkout session (requires auth)
//! ```

pub mod api;
pub mod checkout;
pub mod home;
pub mod meta;
pub mod pricing;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Create all routes for the site.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/pricing", get(pricing::pricing))
        .route("/checkout/success", get(checkout::success))
        .nest("/api", api::routes())
}
