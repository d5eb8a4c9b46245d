//! HTTP implementation of [`IdentityProvider`] backed by Supabase Auth.

use std::sync::Arc;

use async_trait::async_trait;
use beacon_core::UserIdentity;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};

use super::cookie::{RequestCookies, decode_session_cookie, session_cookie_name};
use super::types::SupabaseUser;
use super::{AuthError, IdentityProvider};
use crate::config::{ConfigError, SupabaseConfig};

/// Client for the Supabase Auth REST API.
#[derive(Clone)]
pub struct SupabaseAuthClient {
    inner: Arc<SupabaseAuthClientInner>,
}

struct SupabaseAuthClientInner {
    client: reqwest::Client,
    user_endpoint: String,
    anon_key: SecretString,
    cookie_name: String,
}

impl std::fmt::Debug for SupabaseAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseAuthClient")
            .field("user_endpoint", &self.inner.user_endpoint)
            .field("cookie_name", &self.inner.cookie_name)
            .field("anon_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl SupabaseAuthClient {
    /// Create a new Supabase Auth client.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if no session cookie name can be derived from
    /// the project URL.
    pub fn new(config: &SupabaseConfig) -> Result<Self, ConfigError> {
        let cookie_name = session_cookie_name(&config.url).ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                "SUPABASE_URL".to_string(),
                "cannot derive a project ref from the host".to_string(),
            )
        })?;

        let user_endpoint = format!("{}/auth/v1/user", config.url.as_str().trim_end_matches('/'));

        Ok(Self {
            inner: Arc::new(SupabaseAuthClientInner {
                client: reqwest::Client::new(),
                user_endpoint,
                anon_key: config.anon_key.clone(),
                cookie_name,
            }),
        })
    }

    /// Name of the session cookie this client reads.
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.inner.cookie_name
    }

    /// Verify an access token and fetch its user.
    ///
    /// Returns `None` when Supabase rejects the token.
    #[instrument(skip(self, access_token))]
    async fn fetch_user(&self, access_token: &str) -> Result<Option<SupabaseUser>, AuthError> {
        let response = self
            .inner
            .client
            .get(&self.inner.user_endpoint)
            .header("apikey", self.inner.anon_key.expose_secret())
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            debug!(status = %status, "Supabase rejected access token");
            return Ok(None);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AuthError::Api {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        Ok(Some(response.json::<SupabaseUser>().await?))
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuthClient {
    async fn current_user(
        &self,
        cookies: &RequestCookies,
    ) -> Result<Option<UserIdentity>, AuthError> {
        let Some(session) = decode_session_cookie(cookies, &self.inner.cookie_name) else {
            debug!(cookie = %self.inner.cookie_name, "No usable session cookie");
            return Ok(None);
        };

        match self.fetch_user(&session.access_token).await? {
            Some(user) => UserIdentity::try_from(user).map(Some),
            None => Ok(None),
        }
    }
}
