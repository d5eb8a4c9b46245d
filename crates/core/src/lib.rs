//! Beacon Core - Shared domain types.
//!
//! This crate provides the types shared by the Beacon components:
//! - `web` - Marketing site and checkout API
//! - `cli` - Command-line tools (config check, checkout trigger)
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Identities
//! come from the authentication provider and checkout sessions from the
//! payment provider; this crate only gives them names.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for user IDs, price IDs, quantities, emails
//!   and prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
