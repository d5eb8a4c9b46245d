//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::{ConfigError, SiteConfig};
use crate::stripe::{PaymentProvider, StripeClient};
use crate::supabase::{IdentityProvider, SupabaseAuthClient};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration and the two external collaborators.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    identity: Arc<dyn IdentityProvider>,
    payments: Arc<dyn PaymentProvider>,
}

impl AppState {
    /// Create application state backed by Supabase and Stripe.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a collaborator cannot be built from the
    /// configuration.
    pub fn from_config(config: SiteConfig) -> Result<Self, ConfigError> {
        let identity = SupabaseAuthClient::new(&config.supabase)?;
        let payments = StripeClient::new(&config.stripe);

        Ok(Self::new(config, Arc::new(identity), Arc::new(payments)))
    }

    /// Create application state with explicit collaborators.
    #[must_use]
    pub fn new(
        config: SiteConfig,
        identity: Arc<dyn IdentityProvider>,
        payments: Arc<dyn PaymentProvider>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                identity,
                payments,
            }),
        }
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    /// Get the identity provider.
    #[must_use]
    pub fn identity(&self) -> &dyn IdentityProvider {
        self.inner.identity.as_ref()
    }

    /// Get the payment provider.
    #[must_use]
    pub fn payments(&self) -> &dyn PaymentProvider {
        self.inner.payments.as_ref()
    }
}
