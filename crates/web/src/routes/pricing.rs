//! Pricing page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use beacon_core::{BillingInterval, CurrencyCode, Price, Quantity};
use serde::Deserialize;
use tracing::instrument;

use super::meta::PageMeta;
use crate::config::StripeConfig;
use crate::filters;
use crate::middleware::CspNonce;
use crate::state::AppState;

/// A plan shown on the pricing page.
///
/// Offers with a `price_id` render a checkout button; the rest link to sales.
#[derive(Debug, Clone)]
pub struct Offer {
    /// Stripe price ID posted by the checkout button.
    pub price_id: Option<String>,
    pub product_name: String,
    /// Display price, e.g. `$19`.
    pub price: String,
    /// Display interval, e.g. `/mo`.
    pub interval: String,
    pub tagline: String,
    pub features: Vec<String>,
    /// Visually emphasised plan.
    pub highlighted: bool,
    /// Quantity the checkout button posts, rendered as `data-quantity`.
    pub quantity: Quantity,
}

impl Offer {
    /// Accessible label for the checkout button.
    #[must_use]
    pub fn button_label(&self) -> String {
        format!(
            "Subscribe to {} for {}{}",
            self.product_name, self.price, self.interval
        )
    }
}

fn features(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

/// Build the pricing-page offers from the configured Stripe prices.
#[must_use]
pub fn offers(stripe: &StripeConfig) -> Vec<Offer> {
    let monthly = BillingInterval::Month.suffix().to_string();

    vec![
        Offer {
            price_id: stripe.starter_price_id.clone(),
            product_name: "Starter".to_string(),
            price: Price::from_cents(1900, CurrencyCode::USD).display(),
            interval: monthly.clone(),
            tagline: "For individuals shipping their first product.".to_string(),
            features: features(&["3 projects", "Email support", "Community access"]),
            highlighted: false,
            quantity: Quantity::ONE,
        },
        Offer {
            price_id: stripe.pro_price_id.clone(),
            product_name: "Pro".to_string(),
            price: Price::from_cents(4900, CurrencyCode::USD).display(),
            interval: monthly,
            tagline: "For growing teams that need more room.".to_string(),
            features: features(&[
                "Unlimited projects",
                "Priority support",
                "Team roles",
                "Usage analytics",
            ]),
            highlighted: true,
            quantity: Quantity::ONE,
        },
        Offer {
            price_id: None,
            product_name: "Enterprise".to_string(),
            price: "Custom".to_string(),
            interval: String::new(),
            tagline: "For organisations with security and compliance needs.".to_string(),
            features: features(&["SSO and SCIM", "Dedicated support", "Custom contracts"]),
            highlighted: false,
            quantity: Quantity::ONE,
        },
    ]
}

/// Query parameters for the pricing page.
#[derive(Debug, Default, Deserialize)]
pub struct PricingQuery {
    /// `cancelled` when returning from an abandoned checkout.
    pub checkout: Option<String>,
}

/// Pricing page template.
#[derive(Template, WebTemplate)]
#[template(path = "pricing.html")]
pub struct PricingTemplate {
    pub meta: PageMeta,
    pub nonce: String,
    pub offers: Vec<Offer>,
    /// Show the "checkout cancelled" notice.
    pub checkout_cancelled: bool,
}

/// Display the pricing page.
#[instrument(skip(state, nonce))]
pub async fn pricing(
    State(state): State<AppState>,
    nonce: CspNonce,
    Query(query): Query<PricingQuery>,
) -> PricingTemplate {
    let config = state.config();

    PricingTemplate {
        meta: PageMeta::new(
            "Pricing",
            "Simple monthly plans for Beacon. Start with Starter, grow into Pro.",
        )
        .with_canonical(config.site_url.as_deref(), "/pricing"),
        nonce: nonce.0,
        offers: offers(&config.stripe),
        checkout_cancelled: query.checkout.as_deref() == Some("cancelled"),
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn stripe(starter: Option<&str>, pro: Option<&str>) -> StripeConfig {
        StripeConfig {
            secret_key: SecretString::from("sk_test_51NzQeKLm8vR2aT7bXp4WcYd9Hs3Jf6Ug"),
            api_base: "https://api.stripe.com".to_string(),
            starter_price_id: starter.map(String::from),
            pro_price_id: pro.map(String::from),
        }
    }

    #[test]
    fn test_offers_use_configured_prices() {
        let offers = offers(&stripe(Some("price_starter"), Some("price_pro")));

        assert_eq!(offers.len(), 3);
        assert_eq!(offers[0].price_id.as_deref(), Some("price_starter"));
        assert_eq!(offers[0].price, "$19");
        assert_eq!(offers[1].price_id.as_deref(), Some("price_pro"));
        assert!(offers[1].highlighted);
        assert!(offers[2].price_id.is_none());
        assert!(offers.iter().all(|offer| offer.quantity == Quantity::ONE));
    }

    #[test]
    fn test_offers_without_prices_have_no_button() {
        let offers = offers(&stripe(None, None));
        assert!(offers.iter().all(|offer| offer.price_id.is_none()));
    }

    #[test]
    fn test_button_label() {
        let offers = offers(&stripe(Some("price_starter"), None));
        assert_eq!(offers[0].button_label(), "Subscribe to Starter for $19/mo");
    }
}
