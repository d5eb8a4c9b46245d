//! Checkout session parameters handed to the payment provider.

use std::fmt;

use beacon_core::{Email, PriceId, Quantity, UserId};

use super::StripeError;

/// Placeholder Stripe replaces with the created session's ID in `success_url`.
pub const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Checkout session mode. Beacon only sells subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutMode {
    /// Recurring subscription
    Subscription,
}

impl From<CheckoutMode> for ::stripe::CheckoutSessionMode {
    fn from(mode: CheckoutMode) -> Self {
        match mode {
            CheckoutMode::Subscription => Self::Subscription,
        }
    }
}

/// Line item quantity as the browser sent it.
///
/// Holds the form text of the requested value. Stripe only takes positive
/// integers; [`LineItemQuantity::units`] applies the same check so values the
/// typed request cannot carry are rejected the way Stripe rejects them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItemQuantity(String);

impl LineItemQuantity {
    /// Wrap the form text of a requested quantity.
    #[must_use]
    pub fn from_form_text(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The form text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whole number of units.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::InvalidParam` for anything but a positive
    /// integer. `param` names the field in Stripe's notation.
    pub fn units(&self, param: &str) -> Result<u64, StripeError> {
        let text = self.0.trim();
        let reject = |message: String| StripeError::InvalidParam {
            param: param.to_string(),
            message,
        };

        if let Ok(units) = text.parse::<u64>() {
            if units == 0 {
                return Err(reject("This value must be greater than or equal to 1.".to_string()));
            }
            return Ok(units);
        }
        if text.parse::<i64>().is_ok() {
            return Err(reject("This value must be greater than or equal to 1.".to_string()));
        }
        Err(reject(format!("Invalid integer: {}", self.0)))
    }
}

impl From<Quantity> for LineItemQuantity {
    fn from(quantity: Quantity) -> Self {
        Self(quantity.to_string())
    }
}

impl fmt::Display for LineItemQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One line item of a checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLineItem {
    pub price: PriceId,
    pub quantity: LineItemQuantity,
}

/// Parameters for creating a checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionParams {
    pub line_items: Vec<CheckoutLineItem>,
    pub mode: CheckoutMode,
    /// Must contain [`SESSION_ID_PLACEHOLDER`] so the success page can look
    /// the session up.
    pub success_url: String,
    pub cancel_url: String,
    /// Correlates the Stripe session with the user who started it.
    pub client_reference_id: UserId,
    /// Prefills the email field on the hosted page.
    pub customer_email: Option<Email>,
}

impl CheckoutSessionParams {
    /// Build the SDK request, borrowing from `self`.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::InvalidParam` when a line item quantity is not a
    /// positive integer.
    pub fn to_create_params(&self) -> Result<::stripe::CreateCheckoutSession<'_>, StripeError> {
        let line_items = self
            .line_items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let quantity = item
                    .quantity
                    .units(&format!("line_items[{index}][quantity]"))?;
                Ok(::stripe::CreateCheckoutSessionLineItems {
                    price: Some(item.price.to_string()),
                    quantity: Some(quantity),
                    ..Default::default()
                })
            })
            .collect::<Result<Vec<_>, StripeError>>()?;

        let mut params = ::stripe::CreateCheckoutSession::new();
        params.mode = Some(self.mode.into());
        params.line_items = Some(line_items);
        params.success_url = Some(&self.success_url);
        params.cancel_url = Some(&self.cancel_url);
        params.client_reference_id = Some(self.client_reference_id.as_str());
        params.customer_email = self.customer_email.as_ref().map(Email::as_str);

        Ok(params)
    }
}
