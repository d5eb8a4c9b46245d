//! Site configuration loaded from environment variables.
//!
//! Loaded once by `main` before the listener is bound. Any error here is
//! fatal: the server never starts with a partial configuration.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STRIPE_SECRET_KEY` - Stripe secret (or restricted) API key
//! - `SUPABASE_URL` - Supabase project URL (e.g., <https://abcd.supabase.co>)
//! - `SUPABASE_ANON_KEY` - Supabase public anon key
//!
//! ## Optional
//! - `BEACON_HOST` - Bind address (default: 127.0.0.1)
//! - `BEACON_PORT` - Listen port (default: 3000)
//! - `SITE_URL` - Public base URL for canonical links and checkout return URLs
//! - `STRIPE_API_BASE` - Stripe API base URL (default: <https://api.stripe.com>)
//! - `STRIPE_PRICE_STARTER` - Price ID for the Starter plan button
//! - `STRIPE_PRICE_PRO` - Price ID for the Pro plan button
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";

/// Prefixes Stripe uses for server-side keys (secret and restricted).
const STRIPE_SERVER_KEY_PREFIXES: &[&str] = &["sk_", "rk_"];

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
];

/// Configuration errors that can occur during loading.
///
/// This is also the error category the checkout handler reports as a
/// service configuration error, so the classification never depends on
/// message text.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Site application configuration.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the site, without trailing slash
    pub site_url: Option<String>,
    /// Supabase Auth configuration
    pub supabase: SupabaseConfig,
    /// Stripe configuration
    pub stripe: StripeConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g., production, staging)
    pub sentry_environment: Option<String>,
}

/// Supabase Auth configuration.
///
/// Implements `Debug` manually to redact the anon key.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL (e.g., <https://abcd.supabase.co>)
    pub url: Url,
    /// Public anon key, sent as the `apikey` header
    pub anon_key: SecretString,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &"[REDACTED]")
            .finish()
    }
}

/// Stripe configuration.
///
/// Implements `Debug` manually to redact the secret key.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (server-side only)
    pub secret_key: SecretString,
    /// API base URL
    pub api_base: String,
    /// Price ID behind the Starter plan button
    pub starter_price_id: Option<String>,
    /// Price ID behind the Pro plan button
    pub pro_price_id: Option<String>,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("starter_price_id", &self.starter_price_id)
            .field("pro_price_id", &self.pro_price_id)
            .finish()
    }
}

impl SiteConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the Stripe key fails validation (prefix, placeholder, entropy).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// `lookup` returns the value of a variable, or `None` when unset.
    ///
    /// # Errors
    ///
    /// Same as [`SiteConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let host = env
            .or_default("BEACON_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("BEACON_HOST".to_string(), e.to_string()))?;
        let port = env
            .or_default("BEACON_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("BEACON_PORT".to_string(), e.to_string()))?;
        let site_url = env
            .optional("SITE_URL")
            .map(|value| parse_base_url("SITE_URL", &value))
            .transpose()?;

        let supabase = SupabaseConfig::load(&env)?;
        let stripe = StripeConfig::load(&env)?;

        Ok(Self {
            host,
            port,
            site_url,
            supabase,
            stripe,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl SupabaseConfig {
    fn load(env: &Env<'_>) -> Result<Self, ConfigError> {
        let raw_url = env.required("SUPABASE_URL")?;
        let url = Url::parse(&raw_url)
            .map_err(|e| ConfigError::InvalidEnvVar("SUPABASE_URL".to_string(), e.to_string()))?;
        if url.host_str().is_none() {
            return Err(ConfigError::InvalidEnvVar(
                "SUPABASE_URL".to_string(),
                "must include a host".to_string(),
            ));
        }

        let anon_key = env.required("SUPABASE_ANON_KEY")?;
        if anon_key.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar("SUPABASE_ANON_KEY".to_string()));
        }

        Ok(Self {
            url,
            anon_key: SecretString::from(anon_key),
        })
    }
}

impl StripeConfig {
    fn load(env: &Env<'_>) -> Result<Self, ConfigError> {
        let secret_key = env.required("STRIPE_SECRET_KEY")?;
        validate_stripe_key(&secret_key, "STRIPE_SECRET_KEY")?;

        let api_base = parse_base_url(
            "STRIPE_API_BASE",
            &env.or_default("STRIPE_API_BASE", DEFAULT_STRIPE_API_BASE),
        )?;

        Ok(Self {
            secret_key: SecretString::from(secret_key),
            api_base,
            starter_price_id: env.optional("STRIPE_PRICE_STARTER"),
            pro_price_id: env.optional("STRIPE_PRICE_PRO"),
        })
    }

    /// Whether the key is a test-mode key.
    #[must_use]
    pub fn is_test_mode(&self) -> bool {
        self.secret_key.expose_secret().contains("_test_")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable source the loaders read from.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        (self.0)(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional variable, treating empty values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }
}

/// Parse an absolute http(s) URL and return it without a trailing slash.
pub(crate) fn parse_base_url(var_name: &str, value: &str) -> Result<String, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real API keys are long random strings
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

/// Validate a Stripe server-side key: known prefix, then strength checks.
fn validate_stripe_key(key: &str, var_name: &str) -> Result<(), ConfigError> {
    if !STRIPE_SERVER_KEY_PREFIXES
        .iter()
        .any(|prefix| key.starts_with(prefix))
    {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "must be a secret (sk_) or restricted (rk_) key".to_string(),
        ));
    }
    validate_secret_strength(key, var_name)
}
