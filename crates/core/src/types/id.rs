//! Newtype IDs for opaque external references.
//!
//! Beacon never mints its own identifiers: user IDs come from the
//! authentication provider and price IDs from the payment provider's catalog.
//! Use the `define_external_id!` macro to wrap them so they cannot be mixed up.

use thiserror::Error;

/// Errors that can occur when parsing an external ID.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The input string is empty or only whitespace.
    #[error("{kind} cannot be empty")]
    Empty {
        /// Name of the ID type that was being parsed.
        kind: &'static str,
    },
}

/// Macro to define a type-safe wrapper around an opaque string ID.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - `parse()` rejecting empty input, `as_str()`, `into_inner()`
/// - `Display`, `AsRef<str>` and `FromStr` implementations
///
/// # Example
///
/// ```rust
/// # use beacon_core::define_external_id;
/// define_external_id!(CouponId);
///
/// let coupon = CouponId::parse("SPRING").unwrap();
/// assert_eq!(coupon.as_str(), "SPRING");
/// assert!(CouponId::parse("").is_err());
/// ```
#[macro_export]
macro_rules! define_external_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Parse an ID, rejecting empty input.
            ///
            /// IDs are opaque: anything else is kept verbatim and left for
            /// the issuing provider to accept or reject.
            ///
            /// # Errors
            ///
            /// Returns `IdError::Empty` if the input is empty.
            pub fn parse(value: &str) -> ::core::result::Result<Self, $crate::IdError> {
                if value.is_empty() {
                    return Err($crate::IdError::Empty {
                        kind: stringify!($name),
                    });
                }
                Ok(Self(value.to_owned()))
            }

            /// Returns the ID as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the ID and returns its inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Identifier issued by the authentication provider (Supabase user UUID).
define_external_id!(UserId);
// Catalog reference issued by the payment provider (e.g. `price_1Nx...`).
define_external_id!(PriceId);
