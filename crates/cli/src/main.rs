//! Beacon CLI - configuration checks and checkout tooling.
//!
//! # Usage
//!
//! ```bash
//! # Validate the server environment
//! beacon config check
//!
//! # Start a checkout against a running server
//! beacon checkout --base-url http://localhost:3000 --price-id price_123 \
//!     --cookie "sb-abcd-auth-token=base64-..."
//! ```
//!
//! # Commands
//!
//! - `config check` - Load configuration exactly as the server does
//! - `checkout` - Post to `/api/checkout` and print the hosted checkout URL

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use beacon_cli::commands;
use clap::{Parser, Subcommand};
use url::Url;

#[derive(Parser)]
#[command(name = "beacon")]
#[command(author, version, about = "Beacon CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect site configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Start a checkout session the way the pricing-page button does
    Checkout {
        /// Base URL of a running Beacon server
        #[arg(long, env = "BEACON_BASE_URL", default_value = "http://127.0.0.1:3000")]
        base_url: Url,

        /// Stripe price ID to subscribe to
        #[arg(long)]
        price_id: String,

        /// Number of units
        #[arg(long, default_value_t = 1)]
        quantity: u32,

        /// Raw `Cookie` header carrying the Supabase session
        #[arg(long, env = "BEACON_COOKIE")]
        cookie: Option<String>,

        /// Open the checkout page in a browser
        #[arg(long)]
        open: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Load configuration and report the first error
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "beacon_cli=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Check => commands::config::check()?,
        },
        Commands::Checkout {
            base_url,
            price_id,
            quantity,
            cookie,
            open,
        } => {
            let url = commands::checkout::run(commands::checkout::CheckoutArgs {
                base_url,
                price_id,
                quantity,
                cookie,
                open,
            })
            .await?;
            tracing::info!(%url, "Checkout session ready");
        }
    }
    Ok(())
}
