//! Core types for Beacon.
//!
//! This module provides type-safe wrappers for the checkout domain.

pub mod checkout;
pub mod email;
pub mod id;
pub mod identity;
pub mod price;

pub use checkout::{CheckoutSession, Quantity, QuantityError};
pub use email::{Email, EmailError};
pub use id::{IdError, PriceId, UserId};
pub use identity::UserIdentity;
pub use price::{BillingInterval, CurrencyCode, Price};
