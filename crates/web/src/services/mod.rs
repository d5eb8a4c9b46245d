//! Business logic services for the site.
//!
//! # Services
//!
//! - `checkout` - Validate checkout requests and create payment sessions

pub mod checkout;
