//! Checkout command.
//!
//! # Usage
//!
//! ```bash
//! # Start a checkout as the signed-in browser would
//! beacon checkout --base-url http://localhost:3000 --price-id price_123 \
//!     --cookie "sb-abcd-auth-token=base64-..."
//!
//! # Also open the hosted checkout page
//! beacon checkout --base-url http://localhost:3000 --price-id price_123 --open
//! ```

use beacon_core::{IdError, PriceId, Quantity, QuantityError};
use thiserror::Error;
use url::Url;

use crate::checkout::{
    Activation, CheckoutButton, CheckoutOffer, HttpTransport, TerminalSurface, TransportError,
};

/// Errors that can occur while running the checkout command.
#[derive(Debug, Error)]
pub enum CheckoutCommandError {
    /// Price ID is empty.
    #[error("Invalid price ID: {0}")]
    InvalidPriceId(#[from] IdError),

    /// Quantity is zero.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(#[from] QuantityError),

    /// Transport could not be created.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server or the network refused the checkout.
    #[error("Checkout failed: {0}")]
    Failed(String),
}

/// Options for [`run`].
#[derive(Debug, Clone)]
pub struct CheckoutArgs {
    pub base_url: Url,
    pub price_id: String,
    pub quantity: u32,
    pub cookie: Option<String>,
    pub open: bool,
}

/// Drive one checkout button activation against a running server.
///
/// # Errors
///
/// Returns `CheckoutCommandError::Failed` when the button raised an alert.
pub async fn run(args: CheckoutArgs) -> Result<String, CheckoutCommandError> {
    let price_id = PriceId::parse(&args.price_id)?;
    let quantity = Quantity::new(args.quantity)?;
    let transport = HttpTransport::new(&args.base_url, args.cookie)?;

    let offer = CheckoutOffer {
        product_name: price_id.to_string(),
        price_id,
        price: "the listed price".to_string(),
        quantity,
    };

    let mut button = CheckoutButton::new(offer, transport, TerminalSurface::new(args.open));
    tracing::info!(label = %button.label(), "Activating checkout");

    match button.activate().await {
        Activation::Redirected(url) => Ok(url),
        Activation::Failed(message) => Err(CheckoutCommandError::Failed(message)),
        Activation::Ignored => Err(CheckoutCommandError::Failed(
            "checkout already in progress".to_string(),
        )),
    }
}
