//! Beacon command-line tools.
//!
//! The binary lives in `main.rs`; the checkout trigger is a library module
//! so it can be tested without a terminal.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod commands;
