//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use super::meta::{PageMeta, SITE_NAME};
use super::pricing::{Offer, offers};
use crate::filters;
use crate::middleware::CspNonce;
use crate::state::AppState;

/// A feature highlight on the home page.
#[derive(Debug, Clone)]
pub struct Feature {
    pub title: &'static str,
    pub body: &'static str,
}

/// Static feature highlights.
const FEATURES: &[Feature] = &[
    Feature {
        title: "Ship in minutes",
        body: "Connect a repository and Beacon builds, previews and deploys every push.",
    },
    Feature {
        title: "Know what changed",
        body: "Every release gets a changelog, a diff of its config and a one-click rollback.",
    },
    Feature {
        title: "Built for teams",
        body: "Roles, audit trails and review gates without a separate admin console.",
    },
];

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub meta: PageMeta,
    pub nonce: String,
    pub features: &'static [Feature],
    /// Plans teased below the fold; only those with a checkout button.
    pub teaser_offers: Vec<Offer>,
}

/// Display the home page.
#[instrument(skip(state, nonce))]
pub async fn home(State(state): State<AppState>, nonce: CspNonce) -> HomeTemplate {
    let config = state.config();

    let teaser_offers = offers(&config.stripe)
        .into_iter()
        .filter(|offer| offer.price_id.is_some())
        .collect();

    HomeTemplate {
        meta: PageMeta::new(
            SITE_NAME,
            "Beacon builds, previews and deploys your product on every push.",
        )
        .with_canonical(config.site_url.as_deref(), "/"),
        nonce: nonce.0,
        features: FEATURES,
        teaser_offers,
    }
}
