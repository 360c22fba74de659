//! # Signal Router
//!
//! Command-line front end for the signal router.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │               apps/signal-router (THE BINARY)            │
//! │                                                          │
//! │  ┌─────────────┐   ┌──────────────┐   ┌──────────────┐   │
//! │  │    CLI      │   │   Router     │   │ DeviceContext│   │
//! │  │   (clap)    │──▶│  (facade)    │──▶│  (drivers)   │   │
//! │  └─────────────┘   └──────┬───────┘   └──────────────┘   │
//! │                           ▼                              │
//! │                ┌────────────────────┐                    │
//! │                │ signal-router-core │                    │
//! │                │    (THE LOGIC)     │                    │
//! │                └────────────────────┘                    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! signal-router --config venue.toml check
//! signal-router status
//! signal-router route -f Laptop_1 -t Display_2
//! signal-router connect Laptop_1=Display_1,Display_2
//! ```
//!
//! ## Environment
//!
//! - `SIGNAL_ROUTER_CONFIG`: settings file when `--config` is absent
//! - `SIGNAL_ROUTER_LOG_FORMAT=json`: JSON log lines
//! - `RUST_LOG`: log filter (default `signal_router=info`)

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    init_tracing(cli.verbose);

    // Display startup banner
    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing. Logs go to stderr so command output stays clean.
fn init_tracing(verbose: bool) {
    let log_format =
        std::env::var("SIGNAL_ROUTER_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if verbose {
        "signal_router=debug,signal_router_core=debug"
    } else {
        "signal_router=info,signal_router_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  signal-router v{}
  sources -> switchers -> displays
"#,
        env!("CARGO_PKG_VERSION")
    );
}
