//! Identity of the user making a request.

use serde::{Deserialize, Serialize};

use crate::{Email, UserId};

/// The calling user, as resolved by the authentication provider.
///
/// Never stored by Beacon; it lives for the duration of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Stable identifier issued by the provider.
    pub id: UserId,
    /// Email address, when the provider knows one.
    pub email: Option<Email>,
}

impl UserIdentity {
    /// Create an identity from its parts.
    #[must_use]
    pub const fn new(id: UserId, email: Option<Email>) -> Self {
        Self { id, email }
    }
}
