//! Configuration commands.
//!
//! # Usage
//!
//! ```bash
//! # Validate the environment the server would start with
//! beacon config check
//! ```
//!
//! Reads the same variables as `beacon-web` (including `.env`), so a passing
//! check means the server will get past startup.

use beacon_web::config::{ConfigError, SiteConfig};

/// Load the site configuration and print a redacted summary.
///
/// # Errors
///
/// Returns the first `ConfigError` the server itself would fail with.
#[allow(clippy::print_stdout)]
pub fn check() -> Result<(), ConfigError> {
    let config = SiteConfig::from_env()?;

    println!("Configuration OK");
    println!("  listen:        {}", config.socket_addr());
    println!(
        "  site url:      {}",
        config.site_url.as_deref().unwrap_or("(unset, Origin header fallback)")
    );
    println!("  supabase:      {}", config.supabase.url);
    println!(
        "  stripe:        {} ({})",
        config.stripe.api_base,
        if config.stripe.is_test_mode() { "test mode" } else { "live mode" }
    );
    for (plan, price) in [
        ("starter", &config.stripe.starter_price_id),
        ("pro", &config.stripe.pro_price_id),
    ] {
        let label = format!("{plan} price:");
        println!(
            "  {label:<14} {}",
            price.as_deref().unwrap_or("(unset, contact sales)")
        );
    }
    println!(
        "  sentry:        {}",
        if config.sentry_dsn.is_some() { "enabled" } else { "disabled" }
    );

    tracing::debug!(?config, "Loaded configuration");
    Ok(())
}
