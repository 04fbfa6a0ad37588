//! AUTOLEND: recurring micro-investments on P2P lending marketplaces
//!
//! Entry point. Loads configuration, initialises structured logging,
//! and runs every configured account once, sequentially, printing one
//! summary line per account.

use anyhow::{bail, Result};
use clap::Parser;
use tracing::info;

use autolend::config::AppConfig;
use autolend::engine::run_accounts;
use autolend::gateway::HttpGateway;
use autolend::lenders::build_service;
use autolend::types::Company;

#[derive(Parser, Debug)]
#[command(name = "autolend", version, about = "Automated P2P lending investments")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    config: String,

    /// List and filter candidates without placing any order
    #[arg(long)]
    dry_run: bool,

    /// Only run settings for this lender
    #[arg(long, value_name = "COMPANY")]
    company: Option<Company>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    init_logging();

    let cfg = AppConfig::load(&cli.config)?;
    let settings = cfg.select(cli.company)?;

    info!(
        accounts = settings.len(),
        dry_run = cli.dry_run,
        config = %cli.config,
        "AUTOLEND starting"
    );

    let gateway = HttpGateway::new(&cfg.http)?;
    let endpoints = cfg.endpoints.clone();
    let outcomes = run_accounts(
        &settings,
        |company| build_service(company, gateway.clone(), &endpoints),
        cli.dry_run,
    )
    .await;

    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(report) => println!("{report}"),
            Err(e) => {
                failed += 1;
                eprintln!("{} {} failed: {e}", outcome.company, outcome.username);
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} account runs failed", outcomes.len());
    }
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("autolend=info"));

    let json_logging = std::env::var("AUTOLEND_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
